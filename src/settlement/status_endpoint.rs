//! Defines the endpoint for setting an obligation's payment status.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    database_id::ObligationId,
    settlement::{Obligation, ObligationStatus, set_obligation_status},
};

/// The state needed to update an obligation.
#[derive(Debug, Clone)]
pub struct SetStatusState {
    /// The database connection for managing obligations.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SetStatusState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting an obligation's status.
#[derive(Debug, Clone, Deserialize)]
pub struct SetStatusRequest {
    /// The new status. Any transition between the three statuses is allowed.
    pub status: ObligationStatus,
}

/// A route handler for setting an obligation's payment status.
///
/// Returns the updated obligation, including the audit timestamp of the
/// change.
pub async fn set_obligation_status_endpoint(
    State(state): State<SetStatusState>,
    Path(obligation_id): Path<ObligationId>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Obligation>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let obligation = set_obligation_status(
        obligation_id,
        request.status,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok(Json(obligation))
}
