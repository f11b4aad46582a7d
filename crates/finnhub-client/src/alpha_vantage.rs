//! Alpha Vantage daily candles, reshaped into Finnhub's candle schema so the
//! chart code only ever sees one format.

use chrono::NaiveDate;
use dashboard_core::{CandleSeries, DashboardError};
use serde_json::Value;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Daily OHLCV candles. `full` asks for the 20-year history instead of the
    /// last 100 sessions.
    pub async fn daily_candles(
        &self,
        symbol: &str,
        full: bool,
    ) -> Result<CandleSeries, DashboardError> {
        let outputsize = if full { "full" } else { "compact" };
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", outputsize),
                ("apikey", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| DashboardError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DashboardError::ApiError(format!(
                "Alpha Vantage HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| DashboardError::ParseError(e.to_string()))?;

        parse_daily_series(&json)
    }
}

fn field(values: &Value, key: &str) -> Option<f64> {
    values.get(key).and_then(|v| v.as_str()).and_then(|s| s.parse::<f64>().ok())
}

/// Convert a `TIME_SERIES_DAILY` payload into ascending candles.
pub fn parse_daily_series(json: &Value) -> Result<CandleSeries, DashboardError> {
    if let Some(error) = json.get("Error Message") {
        return Err(DashboardError::ApiError(format!("Alpha Vantage error: {}", error)));
    }

    // Both keys are used for throttling notices depending on plan.
    for key in ["Note", "Information"] {
        if let Some(note) = json.get(key) {
            return Err(DashboardError::RateLimited(format!("Alpha Vantage: {}", note)));
        }
    }

    let series = match json.get(DAILY_SERIES_KEY).and_then(|v| v.as_object()) {
        Some(series) => series,
        None => return Ok(CandleSeries::no_data()),
    };

    let mut rows: Vec<(NaiveDate, &Value)> = series
        .iter()
        .filter_map(|(date, values)| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|d| (d, values))
        })
        .collect();
    rows.sort_by_key(|(date, _)| *date);

    let mut candles = CandleSeries {
        s: "ok".to_string(),
        ..Default::default()
    };

    for (date, values) in rows {
        let (Some(o), Some(h), Some(l), Some(c)) = (
            field(values, "1. open"),
            field(values, "2. high"),
            field(values, "3. low"),
            field(values, "4. close"),
        ) else {
            continue;
        };
        let Some(ts) = date.and_hms_opt(0, 0, 0) else {
            continue;
        };

        candles.t.push(ts.and_utc().timestamp());
        candles.o.push(o);
        candles.h.push(h);
        candles.l.push(l);
        candles.c.push(c);
        candles.v.push(field(values, "5. volume").unwrap_or(0.0));
    }

    if candles.is_empty() {
        return Ok(CandleSeries::no_data());
    }

    Ok(candles)
}
