use anyhow::anyhow;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use finnhub_client::{FinnhubClient, MarketBoard};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{ApiResponse, AppError, AppState};

const NEWS_LOOKBACK_DAYS: i64 = 30;
const NEWS_CATEGORIES: &[&str] = &["general", "forex", "crypto", "merger"];

#[derive(Debug, Deserialize)]
pub struct StockDataQuery {
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub outputsize: Option<String>,
}

pub fn stock_routes() -> Router<AppState> {
    Router::new().route("/api/stock-data", get(get_stock_data))
}

fn missing_key(var: &str) -> AppError {
    AppError::with_status(
        StatusCode::INTERNAL_SERVER_ERROR,
        anyhow!("{} not found in environment variables", var),
    )
}

fn finnhub(state: &AppState) -> Result<&FinnhubClient, AppError> {
    state.finnhub.as_ref().ok_or_else(|| missing_key("FINNHUB_API_KEY"))
}

fn board(state: &AppState) -> Result<&MarketBoard, AppError> {
    state.market.as_ref().ok_or_else(|| missing_key("FINNHUB_API_KEY"))
}

async fn get_stock_data(
    State(state): State<AppState>,
    Query(query): Query<StockDataQuery>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let kind = query.kind.as_deref().unwrap_or("quote");

    // Watchlist views need no symbol
    match kind {
        "market" => {
            let stocks = board(&state)?.market_overview().await;
            return Ok(ApiResponse::success(json!({ "stocks": stocks })));
        }
        "indices" => {
            let indices = board(&state)?.indices().await;
            return Ok(ApiResponse::success(json!({ "indices": indices })));
        }
        "movers" => {
            let movers = board(&state)?.movers().await;
            return Ok(ApiResponse::success(serde_json::to_value(movers)?));
        }
        "market-news" => {
            let category = query.category.as_deref().unwrap_or("general");
            if !NEWS_CATEGORIES.contains(&category) {
                return Err(AppError::with_status(
                    StatusCode::BAD_REQUEST,
                    anyhow!("Unknown news category '{}'", category),
                ));
            }
            let news = finnhub(&state)?.get_market_news(category).await?;
            return Ok(ApiResponse::success(serde_json::to_value(news)?));
        }
        _ => {}
    }

    let symbol = query
        .symbol
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::with_status(StatusCode::BAD_REQUEST, anyhow!("Symbol parameter is required"))
        })?;

    let data = match kind {
        "profile" => serde_json::to_value(finnhub(&state)?.get_company_profile(&symbol).await?)?,
        "news" => {
            let to = Utc::now().date_naive();
            let from = to - Duration::days(NEWS_LOOKBACK_DAYS);
            serde_json::to_value(finnhub(&state)?.get_company_news(&symbol, from, to).await?)?
        }
        "candles" => {
            let client = state
                .alpha_vantage
                .as_ref()
                .ok_or_else(|| missing_key("ALPHA_VANTAGE_API_KEY"))?;
            let full = query.outputsize.as_deref() == Some("full");
            serde_json::to_value(client.daily_candles(&symbol, full).await?)?
        }
        _ => serde_json::to_value(finnhub(&state)?.get_quote(&symbol).await?)?,
    };

    Ok(ApiResponse::success(data))
}
