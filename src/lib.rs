//! Expenseur is a web app for tracking personal expenses.
//!
//! This library provides a JSON REST API for registering users and managing
//! their expenses, a filter/sort pipeline and statistics engine shared by the
//! server and the client, and an offline file-backed cache for use without an
//! account.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod db;
mod error;
mod expense;
mod logging;
mod routing;

pub mod endpoints;
pub mod filter;
pub mod local;
pub mod models;
pub mod pagination;
pub mod stats;
pub mod stores;

pub use app_state::AppState;
pub use auth::{AuthError, Claims};
pub use db::initialize as initialize_db;
pub use error::{Error, FieldError};
pub use logging::logging_middleware;
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
