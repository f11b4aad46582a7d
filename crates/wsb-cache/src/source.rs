use async_trait::async_trait;
use dashboard_core::{RedditComment, RedditPost};
use reddit_client::{RedditClient, RedditResult};

/// Where the refresh job gets posts and comments from.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn hot_posts(&self) -> RedditResult<Vec<RedditPost>>;
    async fn top_comments(&self, permalink: &str) -> RedditResult<Vec<RedditComment>>;
}

#[async_trait]
impl PostSource for RedditClient {
    async fn hot_posts(&self) -> RedditResult<Vec<RedditPost>> {
        RedditClient::hot_posts(self).await
    }

    async fn top_comments(&self, permalink: &str) -> RedditResult<Vec<RedditComment>> {
        RedditClient::top_comments(self, permalink).await
    }
}
