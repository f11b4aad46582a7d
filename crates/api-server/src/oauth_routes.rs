use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use reddit_client::OAuthProbe;

use crate::AppState;

pub fn oauth_routes() -> Router<AppState> {
    Router::new().route("/api/test-reddit-oauth", get(test_reddit_oauth))
}

/// Requests a fresh token, bypassing the cache, and reports the outcome.
async fn test_reddit_oauth(State(state): State<AppState>) -> (StatusCode, Json<OAuthProbe>) {
    let probe = state.reddit.probe_oauth().await;
    let status = if probe.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(probe))
}
