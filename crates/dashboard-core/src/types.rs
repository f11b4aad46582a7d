use serde::{Deserialize, Serialize};

/// Real-time quote in Finnhub's wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    /// Current price
    pub c: f64,
    /// Change
    #[serde(default)]
    pub d: Option<f64>,
    /// Percent change
    #[serde(default)]
    pub dp: Option<f64>,
    /// High of the day
    #[serde(default)]
    pub h: f64,
    /// Low of the day
    #[serde(default)]
    pub l: f64,
    /// Open
    #[serde(default)]
    pub o: f64,
    /// Previous close
    #[serde(default)]
    pub pc: f64,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub t: i64,
}

impl Quote {
    /// Finnhub answers unknown symbols with an all-zero quote.
    pub fn has_price(&self) -> bool {
        self.c != 0.0
    }
}

/// Company profile (Finnhub `stock/profile2`). Unknown symbols come back as `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub finnhub_industry: Option<String>,
    #[serde(default)]
    pub ipo: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub market_capitalization: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub share_outstanding: Option<f64>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub weburl: Option<String>,
}

/// Company or market news article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub related: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
}

/// OHLCV candles in Finnhub's column-oriented shape (`s` is `ok` or `no_data`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandleSeries {
    pub c: Vec<f64>,
    pub h: Vec<f64>,
    pub l: Vec<f64>,
    pub o: Vec<f64>,
    pub t: Vec<i64>,
    pub v: Vec<f64>,
    pub s: String,
}

impl CandleSeries {
    pub fn no_data() -> Self {
        Self {
            s: "no_data".to_string(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// A top-level comment attached to a daily thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditComment {
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    pub permalink: String,
}

/// A subreddit post as stored in the post cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditPost {
    pub reddit_id: String,
    pub title: String,
    pub author: String,
    pub score: i64,
    pub num_comments: i64,
    pub url: String,
    /// Absolute `https://reddit.com/...` link.
    pub permalink: String,
    pub created_utc: f64,
    pub subreddit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_comments: Option<Vec<RedditComment>>,
}

/// The blob stored under the hot-posts cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCache {
    pub posts: Vec<RedditPost>,
    #[serde(default)]
    pub daily_threads: Vec<RedditPost>,
    pub last_updated: String,
    pub total_posts: usize,
}

/// Popularity badge shown next to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Flair {
    Viral,
    Hot,
    Popular,
    New,
    Daily,
}

impl Flair {
    pub fn from_score(score: i64) -> Self {
        if score > 5000 {
            Flair::Viral
        } else if score > 2000 {
            Flair::Hot
        } else if score > 1000 {
            Flair::Popular
        } else {
            Flair::New
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flair_thresholds() {
        assert_eq!(Flair::from_score(5001), Flair::Viral);
        assert_eq!(Flair::from_score(5000), Flair::Hot);
        assert_eq!(Flair::from_score(2001), Flair::Hot);
        assert_eq!(Flair::from_score(1500), Flair::Popular);
        assert_eq!(Flair::from_score(1000), Flair::New);
        assert_eq!(Flair::from_score(-3), Flair::New);
    }

    #[test]
    fn test_flair_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Flair::Daily).unwrap(), "\"DAILY\"");
    }

    #[test]
    fn test_empty_profile_parses() {
        let profile: CompanyProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.name.is_none());
    }

    #[test]
    fn test_quote_nullable_change() {
        let quote: Quote =
            serde_json::from_str(r#"{"c":0,"d":null,"dp":null,"h":0,"l":0,"o":0,"pc":0,"t":0}"#)
                .unwrap();
        assert!(!quote.has_price());
        assert!(quote.dp.is_none());
    }

    #[test]
    fn test_post_cache_without_daily_threads() {
        let raw = r#"{"posts":[],"last_updated":"2025-01-01T00:00:00Z","total_posts":0}"#;
        let cache: PostCache = serde_json::from_str(raw).unwrap();
        assert!(cache.daily_threads.is_empty());
    }
}
