use std::sync::Arc;

use crate::config::AuthFailureResponse;
use crate::pipeline::WebhookProcessor;

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<WebhookProcessor>,
    /// Status returned when a delivery fails signature verification
    pub on_auth_failure: AuthFailureResponse,
    /// Reported in the ping response header
    pub version: &'static str,
}

impl AppState {
    pub fn new(processor: Arc<WebhookProcessor>, on_auth_failure: AuthFailureResponse) -> Self {
        Self {
            processor,
            on_auth_failure,
            version: env!("SWEEPER_REVISION"),
        }
    }
}
