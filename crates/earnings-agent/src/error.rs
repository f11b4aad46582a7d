use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("OPENAI_API_KEY not configured")]
    MissingApiKey,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
