use anyhow::anyhow;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use wsb_cache::WsbListing;

use crate::{ApiResponse, AppError, AppState};

pub fn wsb_routes() -> Router<AppState> {
    Router::new().route("/api/wsb-posts", get(get_wsb_posts))
}

async fn get_wsb_posts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WsbListing>>, AppError> {
    let listing = match state.wsb.listing().await {
        Ok(Some(listing)) => listing,
        Ok(None) => {
            return Err(
                AppError::with_status(StatusCode::NOT_FOUND, anyhow!("No cached data available"))
                    .message("Trigger cache refresh first at /api/refresh-cache"),
            );
        }
        Err(e) if e.is_upstream() => {
            return Err(AppError::with_status(
                StatusCode::SERVICE_UNAVAILABLE,
                anyhow!("Failed to fetch posts"),
            )
            .message("Reddit is unavailable and nothing is cached")
            .details(e.to_string()));
        }
        Err(e) => {
            return Err(AppError::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                anyhow!("Failed to fetch posts"),
            )
            .message("Cache read or data parsing failed")
            .details(e.to_string()));
        }
    };

    if state.wsb.comments_stale().await {
        tracing::info!("Daily thread comments are stale, refreshing in background");
        state.wsb.spawn_comment_refresh();
    }

    Ok(ApiResponse::success(listing))
}
