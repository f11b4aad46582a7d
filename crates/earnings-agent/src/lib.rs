//! Earnings-report analyst backed by the OpenAI Responses API with hosted
//! web search.

pub mod error;
pub mod reply;
pub mod request;

pub use error::{AgentError, AgentResult};
pub use reply::{parse_reply, AgentReply, ToolCall, Usage};
pub use request::{AgentRequest, ChatMessage, PdfAttachment, DEFAULT_PDF_PROMPT, SYSTEM_PROMPT};

use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub reasoning_effort: String,
    pub search_context_size: String,
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "o3".to_string(),
            reasoning_effort: "low".to_string(),
            search_context_size: "high".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("EARNINGS_AGENT_MODEL").unwrap_or(defaults.model),
            reasoning_effort: std::env::var("EARNINGS_AGENT_REASONING_EFFORT")
                .unwrap_or(defaults.reasoning_effort),
            search_context_size: defaults.search_context_size,
            timeout: std::env::var("EARNINGS_AGENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[derive(Clone)]
pub struct EarningsAgent {
    client: reqwest::Client,
    config: AgentConfig,
}

impl EarningsAgent {
    pub fn new(config: AgentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    pub fn from_env() -> Self {
        Self::new(AgentConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn analyze(&self, request: &AgentRequest) -> AgentResult<AgentReply> {
        let api_key = self.config.api_key.as_deref().ok_or(AgentError::MissingApiKey)?;
        let body = request.to_body(&self.config)?;

        tracing::info!(
            "Earnings agent request: model={}, pdf={}",
            self.config.model,
            matches!(request, AgentRequest::Prompt { pdf: Some(_), .. })
        );

        let response = self
            .client
            .post(format!("{}/responses", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("request failed")
                .to_string();
            tracing::error!("Earnings agent error {}: {}", status, message);
            return Err(AgentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply = parse_reply(&payload)?;
        tracing::info!(
            "Earnings agent reply: {} chars, {} web searches",
            reply.text.len(),
            reply.tool.len()
        );
        Ok(reply)
    }
}
