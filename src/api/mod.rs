//! REST API over a shared [`CarbonAdvisor`].
//!
//! - `GET /forecast` returns the published forecast snapshot
//! - `GET /state` returns version, refresh flag and grid condition
//! - `POST /schedule` plans a task against the current snapshot
//! - `POST /refresh` rebuilds the forecast for the configured location

mod handlers;
mod types;

pub use types::{ErrorResponse, RefreshResponse, ScheduleBody, StateResponse};

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::advisor::CarbonAdvisor;
use crate::weather::Location;

/// State shared across all request handlers.
///
/// The advisor's forecast store does its own synchronization, so the
/// state itself is immutable.
pub struct AppState {
    pub advisor: Arc<CarbonAdvisor>,
    /// Location used by `POST /refresh`.
    pub location: Location,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/forecast", get(handlers::get_forecast))
        .route("/state", get(handlers::get_state))
        .route("/schedule", post(handlers::post_schedule))
        .route("/refresh", post(handlers::post_refresh))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
