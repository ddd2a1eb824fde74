//! Defines the endpoint for listing an organization's open settlements.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::{MemberId, OrganizationId},
    settlement::{Settlement, list_settlements},
};

/// The state needed to list settlements.
#[derive(Debug, Clone)]
pub struct ListSettlementsState {
    /// The database connection for reading settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListSettlementsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Optional filters for the settlement listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSettlementsQuery {
    /// Only return settlements created by this member.
    #[serde(default)]
    pub created_by: Option<MemberId>,
}

/// A route handler for listing settlements, most recent first.
pub async fn list_settlements_endpoint(
    State(state): State<ListSettlementsState>,
    Path(organization_id): Path<OrganizationId>,
    Query(query): Query<ListSettlementsQuery>,
) -> Result<Json<Vec<Settlement>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let settlements = list_settlements(organization_id, query.created_by, &connection)?;

    Ok(Json(settlements))
}
