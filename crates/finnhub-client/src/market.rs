//! Fixed-watchlist market views: popular stocks, index ETFs, and movers.
//!
//! Each symbol is fetched concurrently. A failure for one ticker marks only
//! that entry; the batch always completes.

use dashboard_core::{CompanyProfile, Quote, QuoteProvider};
use futures_util::future::join_all;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

pub const POPULAR_STOCKS: &[&str] = &["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA"];

pub const MARKET_INDICES: &[(&str, &str)] = &[
    ("SPY", "S&P 500 ETF"),
    ("QQQ", "NASDAQ 100 ETF"),
    ("DIA", "Dow Jones ETF"),
    ("VTI", "Total Stock Market"),
];

// Finnhub's movers endpoint is premium, so rank a fixed large-cap list instead.
pub const MOVER_UNIVERSE: &[&str] = &[
    "AAPL", "TSLA", "NVDA", "MSFT", "GOOGL", "AMZN", "META", "NFLX", "AMD", "INTC", "CRM", "ORCL",
];

const MOVERS_PER_SIDE: usize = 5;
const FETCH_FAILED: &str = "Failed to fetch data";

#[derive(Debug, Clone, Serialize)]
pub struct StockEntry {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<CompanyProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StockEntry {
    fn price(&self) -> f64 {
        self.data.as_ref().map(|q| q.c).unwrap_or(0.0)
    }

    fn change_percent(&self) -> Option<f64> {
        self.data.as_ref().and_then(|q| q.dp)
    }

    fn is_valid(&self) -> bool {
        self.data.as_ref().is_some_and(Quote::has_price)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub symbol: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketMovers {
    pub gainers: Vec<StockEntry>,
    pub losers: Vec<StockEntry>,
}

#[derive(Clone)]
pub struct MarketBoard {
    provider: Arc<dyn QuoteProvider>,
}

impl MarketBoard {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self { provider }
    }

    async fn stock_entry(&self, symbol: &str) -> StockEntry {
        let (quote, profile) = tokio::join!(
            self.provider.quote(symbol),
            self.provider.company_profile(symbol),
        );

        match (quote, profile) {
            (Ok(data), Ok(profile)) => StockEntry {
                symbol: symbol.to_string(),
                data: Some(data),
                profile: Some(profile),
                error: None,
            },
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Market data fetch failed for {}: {}", symbol, e);
                StockEntry {
                    symbol: symbol.to_string(),
                    data: None,
                    profile: None,
                    error: Some(FETCH_FAILED.to_string()),
                }
            }
        }
    }

    async fn stock_entries(&self, symbols: &[&str]) -> Vec<StockEntry> {
        join_all(symbols.iter().map(|s| self.stock_entry(s))).await
    }

    /// Popular stocks ordered by price (highest first). Failed tickers are kept
    /// at the end with their `error` set.
    pub async fn market_overview(&self) -> Vec<StockEntry> {
        let entries = self.stock_entries(POPULAR_STOCKS).await;
        let (mut valid, failed): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(StockEntry::is_valid);
        valid.sort_by(|a, b| b.price().partial_cmp(&a.price()).unwrap_or(Ordering::Equal));
        valid.extend(failed.into_iter().filter(|e| e.error.is_some()));
        valid
    }

    pub async fn indices(&self) -> Vec<IndexEntry> {
        let fetches = MARKET_INDICES.iter().map(|(symbol, name)| async move {
            match self.provider.quote(symbol).await {
                Ok(data) => IndexEntry {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                    data: Some(data),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Index quote failed for {}: {}", symbol, e);
                    IndexEntry {
                        symbol: symbol.to_string(),
                        name: name.to_string(),
                        data: None,
                        error: Some(FETCH_FAILED.to_string()),
                    }
                }
            }
        });
        join_all(fetches).await
    }

    /// Top gainers and losers by percent change across the mover universe.
    pub async fn movers(&self) -> MarketMovers {
        let valid: Vec<StockEntry> = self
            .stock_entries(MOVER_UNIVERSE)
            .await
            .into_iter()
            .filter(|e| e.is_valid() && e.change_percent().is_some())
            .collect();

        let dp = |e: &StockEntry| e.change_percent().unwrap_or(0.0);

        let mut gainers: Vec<StockEntry> = valid.iter().filter(|e| dp(e) > 0.0).cloned().collect();
        gainers.sort_by(|a, b| dp(b).partial_cmp(&dp(a)).unwrap_or(Ordering::Equal));
        gainers.truncate(MOVERS_PER_SIDE);

        let mut losers: Vec<StockEntry> = valid.into_iter().filter(|e| dp(e) < 0.0).collect();
        losers.sort_by(|a, b| dp(a).partial_cmp(&dp(b)).unwrap_or(Ordering::Equal));
        losers.truncate(MOVERS_PER_SIDE);

        MarketMovers { gainers, losers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dashboard_core::DashboardError;
    use std::collections::HashMap;

    /// Serves canned quotes; symbols listed in `failing` return an error.
    struct StubProvider {
        quotes: HashMap<&'static str, (f64, Option<f64>)>,
        failing: Vec<&'static str>,
    }

    impl StubProvider {
        fn new(quotes: &[(&'static str, f64, Option<f64>)], failing: &[&'static str]) -> Self {
            Self {
                quotes: quotes.iter().map(|(s, c, dp)| (*s, (*c, *dp))).collect(),
                failing: failing.to_vec(),
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for StubProvider {
        async fn quote(&self, symbol: &str) -> Result<Quote, DashboardError> {
            if self.failing.iter().any(|f| *f == symbol) {
                return Err(DashboardError::ApiError("HTTP 502".to_string()));
            }
            let (c, dp) = self.quotes.get(symbol).copied().unwrap_or((0.0, None));
            Ok(Quote { c, dp, ..Default::default() })
        }

        async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, DashboardError> {
            Ok(CompanyProfile {
                ticker: Some(symbol.to_string()),
                ..Default::default()
            })
        }
    }

    fn board(provider: StubProvider) -> MarketBoard {
        MarketBoard::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_indices_mark_only_failed_tickers() {
        let provider = StubProvider::new(
            &[("SPY", 500.0, Some(0.4)), ("DIA", 380.0, Some(-0.2)), ("VTI", 250.0, Some(0.1))],
            &["QQQ"],
        );
        let indices = board(provider).indices().await;

        assert_eq!(indices.len(), 4);
        for entry in &indices {
            if entry.symbol == "QQQ" {
                assert_eq!(entry.error.as_deref(), Some("Failed to fetch data"));
                assert!(entry.data.is_none());
            } else {
                assert!(entry.error.is_none(), "{} should not be errored", entry.symbol);
                assert!(entry.data.is_some());
            }
        }
        assert_eq!(indices[1].name, "NASDAQ 100 ETF");
    }

    #[tokio::test]
    async fn test_market_overview_sorted_with_failures_last() {
        let provider = StubProvider::new(
            &[
                ("AAPL", 190.0, Some(1.0)),
                ("MSFT", 410.0, Some(0.5)),
                ("GOOGL", 140.0, Some(-0.3)),
                ("AMZN", 175.0, Some(0.2)),
                ("NVDA", 880.0, Some(2.1)),
            ],
            &["TSLA"],
        );
        let entries = board(provider).market_overview().await;

        let symbols: Vec<&str> = entries.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["NVDA", "MSFT", "AAPL", "AMZN", "GOOGL", "TSLA"]);
        assert!(entries.last().unwrap().error.is_some());
        assert_eq!(entries.iter().filter(|e| e.error.is_some()).count(), 1);
    }

    #[tokio::test]
    async fn test_movers_split_and_ranked() {
        let provider = StubProvider::new(
            &[
                ("AAPL", 190.0, Some(1.0)),
                ("TSLA", 250.0, Some(-4.0)),
                ("NVDA", 880.0, Some(3.5)),
                ("MSFT", 410.0, Some(-0.5)),
                ("GOOGL", 140.0, Some(0.2)),
                ("AMZN", 175.0, Some(-1.5)),
                ("META", 480.0, Some(2.0)),
                ("NFLX", 600.0, Some(0.9)),
                ("AMD", 160.0, Some(5.0)),
                ("CRM", 290.0, None),
                ("ORCL", 120.0, Some(0.0)),
            ],
            &["INTC"],
        );
        let movers = board(provider).movers().await;

        let gainers: Vec<&str> = movers.gainers.iter().map(|e| e.symbol.as_str()).collect();
        let losers: Vec<&str> = movers.losers.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(gainers, vec!["AMD", "NVDA", "META", "AAPL", "NFLX"]);
        assert_eq!(losers, vec!["TSLA", "AMZN", "MSFT"]);
    }
}
