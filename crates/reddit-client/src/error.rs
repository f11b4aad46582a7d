use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedditError {
    #[error("Missing Reddit credentials in environment variables")]
    MissingCredentials,

    #[error("OAuth failed: {status}")]
    OAuth { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Reddit API failed: {0}")]
    Status(u16),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Reddit API failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<RedditError>,
    },
}

impl RedditError {
    /// True for failures of a single request (connection, status, timeout).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RedditError::Transport(_) | RedditError::Status(_) | RedditError::Timeout(_)
        )
    }
}

pub type RedditResult<T> = Result<T, RedditError>;
