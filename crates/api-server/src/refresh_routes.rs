use anyhow::anyhow;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use sha2::{Digest, Sha256};
use wsb_cache::{RefreshMode, RefreshSummary};

use crate::{ApiResponse, AppError, AppState};

pub fn refresh_routes() -> Router<AppState> {
    Router::new().route("/api/refresh-cache", get(scheduled_refresh).post(manual_refresh))
}

fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when the request carries `Bearer <secret>`. Always false without a
/// configured secret.
fn authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    hash_key(presented) == hash_key(&format!("Bearer {}", secret))
}

async fn scheduled_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<RefreshSummary>>, AppError> {
    if !authorized(&headers, state.config.cron_secret.as_deref()) {
        return Err(AppError::with_status(StatusCode::UNAUTHORIZED, anyhow!("Unauthorized")));
    }

    tracing::info!("Running scheduled refresh, skipping comments");
    let summary = state.wsb.refresh(RefreshMode::SkipComments).await?;
    Ok(ApiResponse::success(summary))
}

async fn manual_refresh(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RefreshSummary>>, AppError> {
    let summary = state.wsb.refresh(RefreshMode::WithComments).await?;
    Ok(ApiResponse::success(summary))
}
