//! Defines the endpoint for creating a new settlement.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    database_id::{MemberId, OrganizationId},
    settlement::{NewObligation, create_settlement},
};

/// The state needed to create a settlement.
#[derive(Debug, Clone)]
pub struct CreateSettlementState {
    /// The database connection for managing settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateSettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a settlement.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSettlementRequest {
    /// The organization collecting the dues.
    pub organization_id: OrganizationId,
    /// A short title for the collection. Must not be empty.
    pub title: String,
    /// Free-text description of what is being collected.
    #[serde(default)]
    pub description: String,
    /// The member creating the settlement, if known.
    #[serde(default)]
    pub created_by: Option<MemberId>,
    /// The participants and their owed amounts. Must not be empty; an amount
    /// of zero is valid and explicit.
    pub participants: Vec<NewObligation>,
}

/// A route handler for creating a new settlement with its obligations.
pub async fn create_settlement_endpoint(
    State(state): State<CreateSettlementState>,
    Json(request): Json<CreateSettlementRequest>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let detail = create_settlement(
        request.organization_id,
        &request.title,
        &request.description,
        request.created_by,
        &request.participants,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(detail)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::State,
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        database_id::MemberId,
        db::initialize,
        directory::create_member,
        settlement::{NewObligation, list_settlements},
    };

    use super::{CreateSettlementRequest, CreateSettlementState, create_settlement_endpoint};

    fn get_test_state() -> (CreateSettlementState, Vec<MemberId>) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let members = vec![
            create_member(1, "Ana", &conn).unwrap().id,
            create_member(1, "Ben", &conn).unwrap().id,
        ];

        (
            CreateSettlementState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            members,
        )
    }

    #[tokio::test]
    async fn can_create_settlement() {
        let (state, members) = get_test_state();

        let response = create_settlement_endpoint(
            State(state.clone()),
            Json(CreateSettlementRequest {
                organization_id: 1,
                title: "Spring retreat".to_owned(),
                description: "Cabin hire".to_owned(),
                created_by: Some(members[0]),
                participants: vec![
                    NewObligation {
                        member_id: members[0],
                        amount: 1_000,
                    },
                    NewObligation {
                        member_id: members[1],
                        amount: 2_000,
                    },
                ],
            }),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let settlements = list_settlements(1, None, &connection).unwrap();
        assert_eq!(settlements.len(), 1);
        assert_eq!(settlements[0].title, "Spring retreat");
    }

    #[tokio::test]
    async fn empty_participant_list_is_a_bad_request() {
        let (state, _) = get_test_state();

        let result = create_settlement_endpoint(
            State(state.clone()),
            Json(CreateSettlementRequest {
                organization_id: 1,
                title: "Spring retreat".to_owned(),
                description: String::new(),
                created_by: None,
                participants: vec![],
            }),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert!(list_settlements(1, None, &connection).unwrap().is_empty());
    }
}
