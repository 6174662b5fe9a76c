//! Webhook delivery handler

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};

use super::super::state::AppState;
use crate::config::AuthFailureResponse;
use crate::webhook::SIGNATURE_HEADER;

/// Query flags that turn a delivery into a dry run
const DRY_RUN_PARAMS: [&str; 2] = ["dry-run", "dryrun"];

/// `POST /feed-item`
///
/// Processing runs inside this future, so outbound bank calls are dropped
/// with it if the client goes away. The platform never sees the processing
/// result: the answer is 200 unless the signature failed and the deployment
/// is configured to reject.
pub async fn feed_item(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let dry_run = DRY_RUN_PARAMS.iter().any(|p| params.contains_key(*p));

    match state.processor.process(&body, signature, dry_run).await {
        Err(e) if e.is_auth_failure() && state.on_auth_failure == AuthFailureResponse::Reject => {
            StatusCode::UNAUTHORIZED
        }
        _ => StatusCode::OK,
    }
}
