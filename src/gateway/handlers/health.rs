//! Liveness check handler

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};

use super::super::state::AppState;

pub const VERSION_HEADER: &str = "starling-sweeper-version";

/// `GET /_ping`
///
/// Fixed body plus the build revision in `Starling-Sweeper-Version`.
pub async fn ping(
    State(state): State<Arc<AppState>>,
) -> ([(HeaderName, HeaderValue); 1], &'static str) {
    let version = HeaderValue::from_str(state.version)
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    ([(HeaderName::from_static(VERSION_HEADER), version)], "PONG\n")
}
