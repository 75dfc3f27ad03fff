use axum::{extract::State, http::StatusCode, response::Response, routing::post, Router};
use std::sync::Arc;

use crate::logger::{self, LogTag};
use crate::webserver::{
    state::AppState,
    utils::{error_response, success_response},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sync", post(trigger_sync))
}

/// POST /api/sync
///
/// Runs one reconciliation pass and returns its report. Concurrent requests
/// wait for the running pass to finish.
async fn trigger_sync(State(state): State<Arc<AppState>>) -> Response {
    let _guard = state.sync_guard.lock().await;
    logger::info(LogTag::Webserver, "Manual sync requested");

    match state.sync.run_once().await {
        Ok(report) => success_response(report),
        Err(e) => {
            logger::error(LogTag::Sync, &format!("Manual sync failed: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.user_message())
        }
    }
}
