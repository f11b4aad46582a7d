use anyhow::anyhow;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use reddit_client::TickerSentiment;
use serde::Serialize;

use crate::db::{DashboardDb, SentimentRow};
use crate::{ApiResponse, AppError, AppState};

const TRENDING_WINDOW_HOURS: i64 = 24;
const TRENDING_LIMIT: i64 = 50;
const TOP_STOCKS: usize = 5;

#[derive(Debug, Serialize)]
pub struct IngestSummary {
    pub processed_stocks: usize,
    pub top_stocks: Vec<TickerSentiment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingStock {
    pub symbol: String,
    pub sentiment: Option<String>,
    pub sentiment_score: f64,
    pub mentions: i64,
    pub trend: &'static str,
    pub last_updated: String,
}

impl From<SentimentRow> for TrendingStock {
    fn from(row: SentimentRow) -> Self {
        Self {
            trend: if row.sentiment_score > 0.0 { "bullish" } else { "bearish" },
            symbol: row.symbol,
            sentiment: row.sentiment_label,
            sentiment_score: row.sentiment_score,
            mentions: row.mention_count,
            last_updated: row.timestamp,
        }
    }
}

pub fn sentiment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sentiment/ingest", post(ingest))
        .route("/api/sentiment/trending", get(trending))
}

fn require_db(state: &AppState) -> Result<&DashboardDb, AppError> {
    state.db.as_ref().ok_or_else(|| {
        AppError::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            anyhow!("Sentiment storage is not configured"),
        )
    })
}

async fn ingest(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<IngestSummary>>, AppError> {
    let db = require_db(&state)?;

    let rows = state.tradestie.wsb_sentiment().await.map_err(|e| {
        AppError::with_status(StatusCode::BAD_GATEWAY, anyhow!("Failed to fetch WSB sentiment"))
            .details(e.to_string())
    })?;

    let processed_stocks = db.insert_sentiment(&rows, Utc::now()).await?;
    tracing::info!("Stored sentiment for {} tickers", processed_stocks);

    Ok(ApiResponse::success(IngestSummary {
        processed_stocks,
        top_stocks: rows.into_iter().take(TOP_STOCKS).collect(),
    }))
}

async fn trending(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TrendingStock>>>, AppError> {
    let db = require_db(&state)?;
    let since = Utc::now() - Duration::hours(TRENDING_WINDOW_HOURS);
    let rows = db
        .trending_since(since, TRENDING_LIMIT)
        .await
        .map_err(|e| {
            AppError::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.context("Failed to fetch sentiment data"),
            )
        })?;

    Ok(ApiResponse::success(rows.into_iter().map(TrendingStock::from).collect()))
}
