use chrono::{SecondsFormat, Utc};
use dashboard_core::{PostCache, RedditPost};
use futures_util::future::join_all;
use reddit_client::partition_posts;
use serde::Serialize;
use std::time::Duration;

use crate::error::CacheResult;
use crate::keys;
use crate::WsbCache;

const SAMPLE_TITLES: usize = 3;
const SAMPLE_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Also fetch top comments for daily threads.
    WithComments,
    /// Posts only; used by the scheduled job.
    SkipComments,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub posts_processed: usize,
    pub daily_threads: usize,
    /// Unix millis at which the posts entry expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_until: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample_titles: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<&'static str>,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

impl WsbCache {
    /// Pull the hot listing and rewrite the cache entries.
    pub async fn refresh(&self, mode: RefreshMode) -> CacheResult<RefreshSummary> {
        tracing::info!("Starting WSB cache refresh ({:?})", mode);

        let listing = self.source.hot_posts().await?;
        let (posts, mut daily_threads) = partition_posts(listing);
        tracing::info!(
            "Processing complete: {} regular posts, {} daily threads",
            posts.len(),
            daily_threads.len()
        );

        if posts.is_empty() {
            tracing::info!("No posts to cache, returning early");
            return Ok(RefreshSummary {
                posts_processed: 0,
                daily_threads: daily_threads.len(),
                cached_until: None,
                sample_titles: Vec::new(),
                message: "No new posts to process".to_string(),
                cache_key: None,
            });
        }

        if mode == RefreshMode::WithComments {
            self.attach_comments(&mut daily_threads).await;
        }

        let snapshot = PostCache {
            total_posts: posts.len(),
            posts,
            daily_threads: daily_threads
                .iter()
                .map(|thread| RedditPost {
                    top_comments: Some(Vec::new()),
                    ..thread.clone()
                })
                .collect(),
            last_updated: now_iso(),
        };

        let posts_ttl = self.settings.posts_ttl;
        self.store
            .set_ex(keys::HOT_POSTS, &serde_json::to_string(&snapshot)?, posts_ttl)
            .await?;

        if mode == RefreshMode::WithComments {
            self.store_comments(&daily_threads).await?;
        }

        self.store
            .set_ex(keys::LAST_UPDATED, &snapshot.last_updated, posts_ttl)
            .await?;

        tracing::info!("Cache refresh completed successfully");
        Ok(RefreshSummary {
            posts_processed: snapshot.posts.len(),
            daily_threads: snapshot.daily_threads.len(),
            cached_until: Some(
                Utc::now()
                    .timestamp_millis()
                    .saturating_add(ttl_millis(posts_ttl)),
            ),
            sample_titles: snapshot
                .posts
                .iter()
                .take(SAMPLE_TITLES)
                .map(|p| p.title.chars().take(SAMPLE_TITLE_CHARS).collect())
                .collect(),
            message: format!(
                "Successfully fetched and cached {} WSB posts",
                snapshot.posts.len()
            ),
            cache_key: Some(keys::HOT_POSTS),
        })
    }

    /// Re-fetch comments for the daily threads currently in the posts entry.
    /// Returns how many threads ended up with comments.
    pub async fn refresh_comments(&self) -> CacheResult<usize> {
        let snapshot: PostCache = match self.read_json(keys::HOT_POSTS).await? {
            Some(snapshot) => snapshot,
            None => {
                tracing::debug!("No cached posts, skipping comment refresh");
                return Ok(0);
            }
        };

        let mut threads = snapshot.daily_threads;
        self.attach_comments(&mut threads).await;
        self.store_comments(&threads).await
    }

    /// Fetch comments for every thread concurrently. A failed fetch leaves
    /// that thread with no comments.
    async fn attach_comments(&self, threads: &mut [RedditPost]) {
        let fetches = threads.iter().map(|thread| {
            let source = self.source.clone();
            let permalink = thread.permalink.clone();
            async move {
                match source.top_comments(&permalink).await {
                    Ok(comments) => comments,
                    Err(e) => {
                        tracing::warn!("Error fetching comments for {}: {}", permalink, e);
                        Vec::new()
                    }
                }
            }
        });

        let results = join_all(fetches).await;
        for (thread, comments) in threads.iter_mut().zip(results) {
            tracing::debug!("Fetched {} comments for {}", comments.len(), thread.reddit_id);
            thread.top_comments = Some(comments);
        }
    }

    /// Stamps `COMMENTS_UPDATED` even when no thread has comments, so an
    /// empty run still counts as fresh. The comment entry itself is only
    /// replaced by a non-empty set.
    async fn store_comments(&self, threads: &[RedditPost]) -> CacheResult<usize> {
        let with_comments: Vec<&RedditPost> = threads
            .iter()
            .filter(|t| t.top_comments.as_ref().is_some_and(|c| !c.is_empty()))
            .collect();

        let ttl = self.settings.comments_ttl;
        if with_comments.is_empty() {
            tracing::info!("No daily thread comments to store");
        } else {
            tracing::info!("Storing comments for {} daily threads", with_comments.len());
            self.store
                .set_ex(keys::DAILY_COMMENTS, &serde_json::to_string(&with_comments)?, ttl)
                .await?;
        }
        self.store.set_ex(keys::COMMENTS_UPDATED, &now_iso(), ttl).await?;
        Ok(with_comments.len())
    }
}
