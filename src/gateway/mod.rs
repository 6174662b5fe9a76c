//! HTTP Gateway
//!
//! Two routes: the webhook receiver and a liveness ping.

pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/feed-item", post(handlers::feed_item))
        .route("/_ping", get(handlers::ping))
        .with_state(state)
}

/// Start HTTP Gateway server
///
/// Runs until Ctrl-C, then lets in-flight deliveries finish.
pub async fn run_server(config: &ServerConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "[gateway] Failed to bind to {}: {} (port {} may already be in use)",
                addr, e, config.port
            );
            return Err(e);
        }
    };

    info!(
        version = state.version,
        "[gateway] Listening on http://{}", addr
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("[gateway] Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("[gateway] Shutdown signal received");
}
