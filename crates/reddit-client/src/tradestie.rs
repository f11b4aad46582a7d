//! Tradestie publishes a daily WSB ticker sentiment snapshot.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RedditError, RedditResult};

const TRADESTIE_BASE: &str = "https://tradestie.com/api/v1/apps/reddit";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickerSentiment {
    pub ticker: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub no_of_comments: i64,
}

#[derive(Clone)]
pub struct TradestieClient {
    client: reqwest::Client,
    url: String,
}

impl Default for TradestieClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TradestieClient {
    pub fn new() -> Self {
        Self::with_base_url(TRADESTIE_BASE)
    }

    pub fn with_base_url(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.to_string(),
        }
    }

    pub async fn wsb_sentiment(&self) -> RedditResult<Vec<TickerSentiment>> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(RedditError::Status(response.status().as_u16()));
        }

        let rows: Vec<TickerSentiment> = response
            .json()
            .await
            .map_err(|e| RedditError::InvalidResponse(e.to_string()))?;

        tracing::info!("Fetched {} tickers from Tradestie", rows.len());
        Ok(rows.into_iter().filter(|r| !r.ticker.is_empty()).collect())
    }
}
