//! Defines the endpoint for a member reading their own obligation.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::{MemberId, SettlementId},
    settlement::{Obligation, viewer_obligation},
};

/// The state needed to read a member's own obligation.
#[derive(Debug, Clone)]
pub struct ViewerObligationState {
    /// The database connection for reading obligations.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ViewerObligationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for reading the calling member's obligation within a
/// settlement.
///
/// A member who is not a participant gets a 404 with a distinct message,
/// never a fabricated zero-amount obligation.
pub async fn viewer_obligation_endpoint(
    State(state): State<ViewerObligationState>,
    Path((settlement_id, member_id)): Path<(SettlementId, MemberId)>,
) -> Result<Json<Obligation>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let obligation = viewer_obligation(settlement_id, member_id, &connection)?;

    Ok(Json(obligation))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        directory::create_member,
        settlement::{NewObligation, create_settlement},
    };

    use super::{ViewerObligationState, viewer_obligation_endpoint};

    #[tokio::test]
    async fn participant_sees_own_obligation_and_outsider_does_not() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let ana = create_member(1, "Ana", &conn).unwrap().id;
        let ben = create_member(1, "Ben", &conn).unwrap().id;
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
        let state = ViewerObligationState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let own = viewer_obligation_endpoint(
            State(state.clone()),
            Path((created.settlement.id, ana)),
        )
        .await
        .unwrap();
        assert_eq!(own.0.amount, 1_000);

        let result =
            viewer_obligation_endpoint(State(state), Path((created.settlement.id, ben))).await;
        assert_eq!(result.err(), Some(Error::NotAParticipant));
    }
}
