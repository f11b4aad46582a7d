use dashboard_core::DashboardError;
use reddit_client::RedditError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cached entry {key} is not valid JSON: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Source(#[from] RedditError),
}

impl CacheError {
    /// Failure came from the upstream post source rather than the store.
    pub fn is_upstream(&self) -> bool {
        matches!(self, CacheError::Source(_))
    }
}

impl From<CacheError> for DashboardError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Source(e) => DashboardError::ApiError(e.to_string()),
            other => DashboardError::CacheError(other.to_string()),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
