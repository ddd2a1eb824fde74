//! Duesbook is the dues settlement and ledger service for a club management
//! application.
//!
//! It collects money owed by members for an event (a settlement), tracks each
//! member's payment status, and, on closing, folds the settlement into an
//! append-only, balance-carrying financial ledger. The library exposes a JSON
//! REST API for the client screens; member and organization directories are
//! external collaborators referenced only by opaque IDs.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
pub mod database_id;
mod db;
pub mod directory;
pub mod endpoints;
mod error;
pub mod ledger;
mod routing;
pub mod settlement;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
