//! Defines the endpoint for reading an organization's current balance.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{AppState, Error, database_id::OrganizationId, ledger::current_balance};

/// The state needed to read a balance.
#[derive(Debug, Clone)]
pub struct CurrentBalanceState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CurrentBalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for the balance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The organization the balance belongs to.
    pub organization_id: OrganizationId,
    /// The current running balance in minor currency units.
    pub balance: i64,
    /// The date the balance was computed for.
    pub as_of: Date,
}

/// A route handler for reading an organization's current balance.
pub async fn current_balance_endpoint(
    State(state): State<CurrentBalanceState>,
    Path(organization_id): Path<OrganizationId>,
) -> Result<Json<BalanceResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let today = OffsetDateTime::now_utc().date();
    let balance = current_balance(organization_id, today, &connection)?;

    Ok(Json(BalanceResponse {
        organization_id,
        balance,
        as_of: today,
    }))
}
