use dashboard_core::{RedditComment, RedditPost};
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{OAuthProbe, RedditAuth};
use crate::error::{RedditError, RedditResult};
use crate::models::{truncate_chars, LinkData, Listing, REDDIT_WEB};
use crate::retry::with_retry;
use crate::RedditConfig;

const COMMENT_LIMIT: usize = 5;
const MAX_COMMENT_CHARS: usize = 200;
const AUTOMODERATOR: &str = "AutoModerator";

/// Strip the web host from a stored permalink so it can be replayed against
/// the OAuth API host.
pub fn permalink_path(permalink: &str) -> &str {
    for prefix in ["https://www.reddit.com", "https://reddit.com", "https://old.reddit.com"] {
        if let Some(path) = permalink.strip_prefix(prefix) {
            return path;
        }
    }
    permalink
}

#[derive(Clone)]
pub struct RedditClient {
    http: Client,
    auth: RedditAuth,
    config: Arc<RedditConfig>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        let config = Arc::new(config);
        Self {
            auth: RedditAuth::new(http.clone(), config.clone()),
            http,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(RedditConfig::from_env())
    }

    pub fn subreddit(&self) -> &str {
        &self.config.subreddit
    }

    pub fn auth(&self) -> &RedditAuth {
        &self.auth
    }

    pub async fn probe_oauth(&self) -> OAuthProbe {
        self.auth.probe().await
    }

    /// A 401 drops the cached token so the next call authenticates again.
    async fn authorized_get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> RedditResult<reqwest::Response> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(header::USER_AGENT, &self.config.user_agent)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
        }
        if !response.status().is_success() {
            return Err(RedditError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    /// Hot posts for the configured subreddit, newest listing order.
    pub async fn hot_posts(&self) -> RedditResult<Vec<RedditPost>> {
        let url = format!("{}/r/{}/hot", self.config.api_base, self.config.subreddit);
        let query = [("limit", self.config.listing_limit.to_string())];
        let (url, query) = (&url, &query);

        tracing::info!("Fetching r/{} hot posts", self.config.subreddit);
        let listing: Listing<LinkData> =
            with_retry(&self.config.retry, "Reddit hot listing", || async move {
                let response = self.authorized_get(url, query).await?;
                response
                    .json::<Listing<LinkData>>()
                    .await
                    .map_err(|e| RedditError::InvalidResponse(e.to_string()))
            })
            .await?;

        tracing::info!("Found {} posts from Reddit", listing.data.children.len());
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|thing| thing.data.into_post(&self.config.subreddit))
            .collect())
    }

    /// Top-scored comments of a post. `permalink` may be absolute or a path.
    pub async fn top_comments(&self, permalink: &str) -> RedditResult<Vec<RedditComment>> {
        let url = format!("{}{}", self.config.api_base, permalink_path(permalink));
        let query = [("sort", "top".to_string()), ("limit", COMMENT_LIMIT.to_string())];

        let body: Value = self
            .authorized_get(&url, &query)
            .await?
            .json()
            .await
            .map_err(|e| RedditError::InvalidResponse(e.to_string()))?;

        Ok(parse_top_comments(&body))
    }
}

/// Comments endpoint returns `[post_listing, comment_listing]`. Deleted
/// comments, AutoModerator, and "more" stubs are skipped.
pub fn parse_top_comments(body: &Value) -> Vec<RedditComment> {
    let children = match body
        .get(1)
        .and_then(|listing| listing.pointer("/data/children"))
        .and_then(Value::as_array)
    {
        Some(children) => children,
        None => return Vec::new(),
    };

    children
        .iter()
        .take(COMMENT_LIMIT)
        .filter_map(|child| {
            let data = child.get("data")?;
            let body = data.get("body")?.as_str()?;
            let author = data.get("author").and_then(Value::as_str).unwrap_or("[deleted]");
            if body.is_empty() || body == "[deleted]" || author == AUTOMODERATOR {
                return None;
            }

            let body = match truncate_chars(body, MAX_COMMENT_CHARS) {
                Some(short) => format!("{}...", short),
                None => body.to_string(),
            };
            let permalink = data.get("permalink").and_then(Value::as_str).unwrap_or_default();

            Some(RedditComment {
                author: author.to_string(),
                body,
                score: data.get("score").and_then(Value::as_i64).unwrap_or(0),
                created_utc: data.get("created_utc").and_then(Value::as_f64).unwrap_or(0.0),
                permalink: format!("{}{}", REDDIT_WEB, permalink),
            })
        })
        .collect()
}
