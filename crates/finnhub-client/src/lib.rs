pub mod alpha_vantage;
pub mod market;

pub use alpha_vantage::AlphaVantageClient;
pub use market::{IndexEntry, MarketBoard, MarketMovers, StockEntry};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashboard_core::{CompanyProfile, DashboardError, NewsItem, Quote, QuoteProvider};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            let oldest = match ts.front().copied() {
                Some(oldest) if ts.len() >= self.max_requests => oldest,
                _ => {
                    ts.push_back(now);
                    return;
                }
            };

            // Wait until the oldest request falls out of the window
            let sleep_dur = (oldest + self.window).duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Finnhub API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        // Free tier allows 60 calls/minute.
        let rate_limit: usize = std::env::var("FINNHUB_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, DashboardError> {
        let request = builder.build().map_err(|e| DashboardError::ApiError(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| DashboardError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| DashboardError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 5u64;
            tracing::warn!(
                "Finnhub 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(DashboardError::RateLimited("Rate limited by Finnhub after 3 retries".to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DashboardError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .send_request(self.client.get(&url).query(query).query(&[("token", &self.api_key)]))
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DashboardError::ParseError(e.to_string()))
    }

    /// Get the real-time quote for a symbol
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, DashboardError> {
        self.get_json("/quote", &[("symbol", symbol)]).await
    }

    /// Get the company profile for a symbol
    pub async fn get_company_profile(
        &self,
        symbol: &str,
    ) -> Result<CompanyProfile, DashboardError> {
        self.get_json("/stock/profile2", &[("symbol", symbol)]).await
    }

    /// Get company news between two dates (inclusive)
    pub async fn get_company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsItem>, DashboardError> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        self.get_json("/company-news", &[("symbol", symbol), ("from", &from), ("to", &to)])
            .await
    }

    /// Get general market news (`general`, `forex`, `crypto`, `merger`)
    pub async fn get_market_news(&self, category: &str) -> Result<Vec<NewsItem>, DashboardError> {
        self.get_json("/news", &[("category", category)]).await
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    async fn quote(&self, symbol: &str) -> Result<Quote, DashboardError> {
        self.get_quote(symbol).await
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, DashboardError> {
        self.get_company_profile(symbol).await
    }
}
