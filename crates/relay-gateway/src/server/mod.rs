//! Relay server setup
//!
//! Provides the HTTP router, the upgrade endpoint and the listener loop.

mod handler;
mod state;

pub use handler::{relay_handler, SocketLimits};
pub use state::RelayState;

use crate::hub::HubStats;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use relay_common::{AppError, AppResult, RelayConfig};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the relay router with the upgrade endpoint at `path`
pub fn create_router(path: &str) -> Router<RelayState> {
    Router::new()
        .route(path, get(relay_handler))
        .route("/health", get(health_check))
        .route("/stats", get(hub_stats))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Hub counters
async fn hub_stats(State(state): State<RelayState>) -> Result<Json<HubStats>, StatusCode> {
    state
        .hub()
        .stats()
        .await
        .map(Json)
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

/// Build the complete application
pub fn create_app(state: RelayState) -> Router {
    create_router(&state.config().server.path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, config: RelayConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().map_err(AppError::Server)?;
    let path = config.server.path.clone();

    let app = create_app(RelayState::start(config));

    tracing::info!("Relay listening on ws://{}{}", addr, path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(AppError::Server)
}

/// Bind the configured address and run the relay until Ctrl-C
///
/// Failing to bind is fatal and reported as [`AppError::Listen`].
pub async fn run(config: RelayConfig) -> AppResult<()> {
    let addr = config.server.address();

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::listen(&addr, e))?;

    serve(listener, config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received");
}
