use chrono::{DateTime, SecondsFormat, Utc};
use dashboard_core::{Flair, PostCache, RedditComment, RedditPost, Sentiment};
use serde::Serialize;
use std::collections::HashMap;
use tokio::task::JoinHandle;

use crate::error::CacheResult;
use crate::keys;
use crate::refresh::RefreshMode;
use crate::WsbCache;

/// A post card as the dashboard renders it.
#[derive(Debug, Clone, Serialize)]
pub struct ListedPost {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub flair: Flair,
    pub score: i64,
    pub comments: i64,
    /// Position in the hot listing, 1-based.
    pub rank: usize,
    pub url: String,
    #[serde(rename = "externalUrl", skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    pub sentiment: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_comments: Option<Vec<RedditComment>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WsbListing {
    pub posts: Vec<ListedPost>,
    pub daily_threads: Vec<ListedPost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

fn iso_from_unix(created_utc: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis((created_utc * 1000.0) as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_listed(post: RedditPost, index: usize, daily: bool) -> ListedPost {
    let external_url =
        (post.url != post.permalink && !post.url.is_empty()).then(|| post.url.clone());
    ListedPost {
        created_at: iso_from_unix(post.created_utc),
        flair: if daily { Flair::Daily } else { Flair::from_score(post.score) },
        sentiment: Sentiment::from_text(&post.title),
        rank: index + 1,
        score: post.score,
        comments: post.num_comments,
        external_url,
        top_comments: daily.then(|| post.top_comments.unwrap_or_default()),
        id: post.reddit_id,
        title: post.title,
        author: post.author,
        url: post.permalink,
    }
}

/// Shape a cached snapshot for the dashboard. Ranks follow the hot-listing
/// order; regular posts are then sorted by score, highest first.
pub fn transform(
    snapshot: PostCache,
    comments: &HashMap<String, Vec<RedditComment>>,
) -> WsbListing {
    let mut posts: Vec<ListedPost> = snapshot
        .posts
        .into_iter()
        .enumerate()
        .map(|(i, post)| to_listed(post, i, false))
        .collect();
    posts.sort_by(|a, b| b.score.cmp(&a.score));

    let daily_threads = snapshot
        .daily_threads
        .into_iter()
        .enumerate()
        .map(|(i, mut thread)| {
            if let Some(cached) = comments.get(&thread.reddit_id) {
                thread.top_comments = Some(cached.clone());
            }
            to_listed(thread, i, true)
        })
        .collect();

    WsbListing {
        posts,
        daily_threads,
        last_updated: Some(snapshot.last_updated),
    }
}

impl WsbCache {
    /// Cached listing, or `None` when nothing is cached.
    ///
    /// With read-through enabled a miss triggers a posts-only refresh first;
    /// a failed refresh is returned as an error.
    pub async fn listing(&self) -> CacheResult<Option<WsbListing>> {
        let snapshot: PostCache = match self.read_json(keys::HOT_POSTS).await? {
            Some(snapshot) => snapshot,
            None if self.settings.read_through => {
                tracing::info!("Post cache miss, refreshing before read");
                self.refresh(RefreshMode::SkipComments).await?;
                match self.read_json(keys::HOT_POSTS).await? {
                    Some(snapshot) => snapshot,
                    None => return Ok(None),
                }
            }
            None => return Ok(None),
        };

        let comments = self.cached_comments().await;
        let mut listing = transform(snapshot, &comments);
        if let Some(stamp) = self.store.get(keys::LAST_UPDATED).await? {
            listing.last_updated = Some(stamp);
        }
        Ok(Some(listing))
    }

    /// Comment sets keyed by thread id. A corrupt entry is logged and ignored.
    async fn cached_comments(&self) -> HashMap<String, Vec<RedditComment>> {
        match self.read_json::<Vec<RedditPost>>(keys::DAILY_COMMENTS).await {
            Ok(Some(threads)) => threads
                .into_iter()
                .filter_map(|t| t.top_comments.map(|c| (t.reddit_id, c)))
                .collect(),
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!("Ignoring cached comments: {}", e);
                HashMap::new()
            }
        }
    }

    /// True when comments were never cached or are older than the staleness
    /// window.
    pub async fn comments_stale(&self) -> bool {
        let stamp = match self.store.get(keys::COMMENTS_UPDATED).await {
            Ok(Some(stamp)) => stamp,
            Ok(None) => return true,
            Err(e) => {
                tracing::warn!("Could not read comment timestamp: {}", e);
                return false;
            }
        };

        match DateTime::parse_from_rfc3339(&stamp) {
            Ok(updated) => {
                let age = Utc::now().signed_duration_since(updated.with_timezone(&Utc));
                age.to_std().is_ok_and(|age| age > self.settings.comments_stale_after)
            }
            Err(_) => true,
        }
    }

    /// Refresh comments in the background. Failures are only logged.
    pub fn spawn_comment_refresh(&self) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            match cache.refresh_comments().await {
                Ok(count) => tracing::info!("Background comment refresh updated {} threads", count),
                Err(e) => tracing::warn!("Background comment refresh failed: {}", e),
            }
        })
    }
}
