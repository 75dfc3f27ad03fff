use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::logger::{self, LogTag};
use crate::webserver::{
    state::AppState,
    utils::{error_response, success_response},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    token: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/get-firebase-token", post(get_token))
}

/// POST /api/get-firebase-token
///
/// Body `{ walletAddress }`. A missing or empty address is a 400; anything
/// else that goes wrong, unreadable bodies included, is a 500.
async fn get_token(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: TokenRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            logger::error(LogTag::Auth, &format!("Error creating custom token: {}", e));
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let Some(wallet_address) = request.wallet_address.filter(|w| !w.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing walletAddress");
    };

    match state.token_issuer.issue(&wallet_address) {
        Ok(token) => success_response(TokenResponse { token }),
        Err(e) => {
            logger::error(LogTag::Auth, &format!("Error creating custom token: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
