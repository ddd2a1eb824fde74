//! Defines the endpoint for discarding a settlement without ledger posting.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{AppState, Error, database_id::SettlementId, settlement::close_without_ledger};

/// The state needed to discard a settlement.
#[derive(Debug, Clone)]
pub struct DiscardSettlementState {
    /// The database connection for managing settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DiscardSettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for discarding a settlement without posting to the ledger.
///
/// This is terminal and leaves no durable record of the collection; clients
/// must warn the operator before sending this request.
pub async fn discard_settlement_endpoint(
    State(state): State<DiscardSettlementState>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    close_without_ledger(settlement_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
