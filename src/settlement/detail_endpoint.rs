//! Defines the endpoint for fetching a settlement with its obligations.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::SettlementId,
    settlement::{SettlementDetail, get_settlement},
};

/// The state needed to fetch a settlement.
#[derive(Debug, Clone)]
pub struct GetSettlementState {
    /// The database connection for reading settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetSettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching one settlement and its obligations in
/// participant-list order.
pub async fn get_settlement_endpoint(
    State(state): State<GetSettlementState>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<Json<SettlementDetail>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let detail = get_settlement(settlement_id, &connection)?;

    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        directory::create_member,
        settlement::{NewObligation, create_settlement},
    };

    use super::{GetSettlementState, get_settlement_endpoint};

    #[tokio::test]
    async fn returns_settlement_with_obligations() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let ana = create_member(1, "Ana", &conn).unwrap().id;
        let created = create_settlement(
            1,
            "Spring retreat",
            "",
            None,
            &[NewObligation {
                member_id: ana,
                amount: 1_000,
            }],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        )
        .unwrap();
        let state = GetSettlementState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_settlement_endpoint(State(state), Path(created.settlement.id))
            .await
            .unwrap();

        assert_eq!(response.0, created);
    }

    #[tokio::test]
    async fn missing_settlement_is_not_found() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = GetSettlementState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let result = get_settlement_endpoint(State(state), Path(42)).await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
