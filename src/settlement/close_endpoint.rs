//! Defines the endpoint for closing a settlement into the ledger.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    database_id::SettlementId,
    ledger::LedgerEntry,
    settlement::close_with_ledger,
};

/// The state needed to close a settlement.
#[derive(Debug, Clone)]
pub struct CloseSettlementState {
    /// The database connection for the close transaction.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CloseSettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for a successful ledger-posting close.
///
/// Echoes the appended entries so the client can state unambiguously that
/// ledger posting succeeded and show the new running balance.
#[derive(Debug, Clone, Serialize)]
pub struct CloseResponse {
    /// The ledger entries that were posted, in participant-list order.
    pub posted: Vec<LedgerEntry>,
}

/// A route handler for closing a fully-paid settlement into the ledger.
///
/// If the close fails for any reason the settlement is left intact and the
/// client may retry.
pub async fn close_settlement_endpoint(
    State(state): State<CloseSettlementState>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<Json<CloseResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let posted = close_with_ledger(settlement_id, OffsetDateTime::now_utc(), &connection)?;

    Ok(Json(CloseResponse { posted }))
}
