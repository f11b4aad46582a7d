//! Post cache for r/wallstreetbets.
//!
//! A refresh job writes the hot listing into a key-value store; page loads
//! read it back, merge in the separately cached daily-thread comments, and
//! shape it for the dashboard.

pub mod error;
pub mod keys;
pub mod listing;
pub mod refresh;
pub mod source;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use listing::{ListedPost, WsbListing};
pub use refresh::{RefreshMode, RefreshSummary};
pub use source::PostSource;
pub use store::{CacheStore, MemoryStore, RedisStore};

use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub posts_ttl: Duration,
    pub comments_ttl: Duration,
    pub comments_stale_after: Duration,
    /// On a miss, refresh synchronously instead of reporting "no data".
    pub read_through: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            posts_ttl: keys::POSTS_TTL,
            comments_ttl: keys::COMMENTS_TTL,
            comments_stale_after: keys::COMMENTS_STALE_AFTER,
            read_through: false,
        }
    }
}

impl CacheSettings {
    /// Reads `WSB_POSTS_TTL_SECS` and `WSB_READ_THROUGH`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(secs) = std::env::var("WSB_POSTS_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            settings.posts_ttl = Duration::from_secs(secs);
        }
        settings.read_through = std::env::var("WSB_READ_THROUGH")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        settings
    }
}

#[derive(Clone)]
pub struct WsbCache {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn PostSource>,
    settings: CacheSettings,
}

impl WsbCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        source: Arc<dyn PostSource>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            store,
            source,
            settings,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &'static str,
    ) -> CacheResult<Option<T>> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| CacheError::Corrupt { key, source }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use dashboard_core::{RedditComment, RedditPost};
    use reddit_client::{RedditError, RedditResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub fn post(id: &str, title: &str, author: &str, score: i64) -> RedditPost {
        RedditPost {
            reddit_id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            score,
            num_comments: score / 10,
            url: format!("https://i.redd.it/{}.png", id),
            permalink: format!("https://reddit.com/r/wallstreetbets/comments/{}/x/", id),
            created_utc: 1_748_937_600.0,
            subreddit: "wallstreetbets".to_string(),
            top_comments: None,
        }
    }

    pub fn comment(author: &str, body: &str) -> RedditComment {
        RedditComment {
            author: author.to_string(),
            body: body.to_string(),
            score: 12,
            created_utc: 1_748_940_000.0,
            permalink: "https://reddit.com/r/wallstreetbets/comments/d1/x/c1/".to_string(),
        }
    }

    #[derive(Default)]
    pub struct FakeSource {
        pub posts: Mutex<Vec<RedditPost>>,
        pub comments: Vec<RedditComment>,
        pub fail_listing: bool,
        pub listing_calls: AtomicUsize,
        pub comment_calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn with_posts(posts: Vec<RedditPost>) -> Self {
            Self {
                posts: Mutex::new(posts),
                comments: vec![comment("degen", "calls"), comment("bear", "puts")],
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PostSource for FakeSource {
        async fn hot_posts(&self) -> RedditResult<Vec<RedditPost>> {
            self.listing_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_listing {
                return Err(RedditError::RetriesExhausted {
                    attempts: 3,
                    last: Box::new(RedditError::Status(503)),
                });
            }
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn top_comments(&self, _permalink: &str) -> RedditResult<Vec<RedditComment>> {
            self.comment_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.comments.clone())
        }
    }

    pub fn sample_posts() -> Vec<RedditPost> {
        vec![
            post("a1", "NVDA calls printing, record gains", "degen", 1500),
            post("d1", "Daily Discussion Thread for June 03, 2025", "AutoModerator", 300),
            post("a2", "Lost everything on puts", "bear", 6200),
            post("a3", "What is a stock", "newbie", 20),
            post("d2", "What Are Your Moves Tomorrow, June 03, 2025", "AutoModerator", 150),
        ]
    }

    pub fn cache_with(
        source: Arc<FakeSource>,
        settings: CacheSettings,
    ) -> (WsbCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (WsbCache::new(store.clone(), source, settings), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_key_lifetimes() {
        let settings = CacheSettings::default();
        assert_eq!(settings.posts_ttl, Duration::from_secs(86_400));
        assert_eq!(settings.comments_ttl, Duration::from_secs(14_400));
        assert!(!settings.read_through);
    }

    #[test]
    fn test_source_errors_are_upstream() {
        let err = CacheError::Source(reddit_client::RedditError::MissingCredentials);
        assert!(err.is_upstream());
        assert!(matches!(
            dashboard_core::DashboardError::from(err),
            dashboard_core::DashboardError::ApiError(_)
        ));
    }
}
