//! Defines the endpoint for listing an organization's ledger entries over a
//! calendar period.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    database_id::OrganizationId,
    ledger::{LedgerEntry, list_entries},
};

/// The state needed to list ledger entries.
#[derive(Debug, Clone)]
pub struct ListLedgerState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListLedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters selecting the period to list, both dates inclusive.
///
/// Clients typically pass a calendar month; the running balance stays
/// continuous across months regardless of the window chosen.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerPeriodQuery {
    /// The first date of the period.
    pub from: Date,
    /// The last date of the period.
    pub to: Date,
}

/// A route handler for listing ledger entries, most recent first.
pub async fn list_ledger_endpoint(
    State(state): State<ListLedgerState>,
    Path(organization_id): Path<OrganizationId>,
    Query(period): Query<LedgerPeriodQuery>,
) -> Result<Json<Vec<LedgerEntry>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let entries = list_entries(organization_id, period.from, period.to, &connection)?;

    Ok(Json(entries))
}
