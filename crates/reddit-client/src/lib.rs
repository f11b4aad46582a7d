pub mod auth;
pub mod classify;
pub mod client;
pub mod error;
pub mod models;
pub mod retry;
pub mod tradestie;

pub use auth::{OAuthProbe, RedditAuth};
pub use classify::{is_daily_thread, partition_posts};
pub use client::{permalink_path, RedditClient};
pub use error::{RedditError, RedditResult};
pub use retry::{with_retry, RetryPolicy};
pub use tradestie::{TickerSentiment, TradestieClient};

pub const DEFAULT_USER_AGENT: &str = "web:stonks-app:v1.0.0 (by /u/stonks-dashboard)";
pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const API_BASE: &str = "https://oauth.reddit.com";

/// Configuration for the Reddit OAuth client
#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: String,
    pub token_url: String,
    pub api_base: String,
    pub subreddit: String,
    pub listing_limit: u32,
    pub retry: RetryPolicy,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: std::env::var("REDDIT_CLIENT_ID").ok().filter(|v| !v.is_empty()),
            client_secret: std::env::var("REDDIT_CLIENT_SECRET").ok().filter(|v| !v.is_empty()),
            user_agent: std::env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            token_url: TOKEN_URL.to_string(),
            api_base: API_BASE.to_string(),
            subreddit: std::env::var("REDDIT_SUBREDDIT")
                .unwrap_or_else(|_| "wallstreetbets".to_string()),
            listing_limit: 25,
            retry: RetryPolicy::default(),
        }
    }
}

impl RedditConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Point both the token and API endpoints at another host.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.token_url = format!("{}/api/v1/access_token", base);
        self.api_base = base.to_string();
        self
    }
}
