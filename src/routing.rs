//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    AppState, endpoints,
    ledger::{current_balance_endpoint, list_ledger_endpoint},
    settlement::{
        close_settlement_endpoint, create_settlement_endpoint, discard_settlement_endpoint,
        get_settlement_endpoint, list_settlements_endpoint, set_obligation_status_endpoint,
        viewer_obligation_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::SETTLEMENTS, post(create_settlement_endpoint))
        .route(
            endpoints::ORGANIZATION_SETTLEMENTS,
            get(list_settlements_endpoint),
        )
        .route(
            endpoints::SETTLEMENT,
            get(get_settlement_endpoint).delete(discard_settlement_endpoint),
        )
        .route(endpoints::SETTLEMENT_CLOSE, post(close_settlement_endpoint))
        .route(
            endpoints::VIEWER_OBLIGATION,
            get(viewer_obligation_endpoint),
        )
        .route(
            endpoints::OBLIGATION_STATUS,
            put(set_obligation_status_endpoint),
        )
        .route(endpoints::ORGANIZATION_LEDGER, get(list_ledger_endpoint))
        .route(endpoints::ORGANIZATION_BALANCE, get(current_balance_endpoint))
        .fallback(get_unknown_route)
        .with_state(state)
}

/// The fallback for requests that match no route.
async fn get_unknown_route() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}
