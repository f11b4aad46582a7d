//! Application-only OAuth (client credentials) with an in-memory token cache.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{RedditError, RedditResult};
use crate::models::TokenResponse;
use crate::RedditConfig;

/// Tokens are treated as expired this long before Reddit says they are.
pub const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Result of an uncached token request, for the diagnostics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OAuthProbe {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct RedditAuth {
    http: reqwest::Client,
    config: Arc<RedditConfig>,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl RedditAuth {
    pub fn new(http: reqwest::Client, config: Arc<RedditConfig>) -> Self {
        Self {
            http,
            config,
            token: Arc::new(Mutex::new(None)),
        }
    }

    fn credentials(&self) -> RedditResult<(&str, &str)> {
        match (self.config.client_id.as_deref(), self.config.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(RedditError::MissingCredentials),
        }
    }

    async fn request_token(&self) -> RedditResult<reqwest::Response> {
        let (client_id, client_secret) = self.credentials()?;
        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(client_id, Some(client_secret))
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .form(&[("grant_type", "client_credentials"), ("scope", "read")])
            .send()
            .await?;
        Ok(response)
    }

    /// Return the cached bearer token, fetching a new one when absent or
    /// within [`TOKEN_SAFETY_MARGIN`] of expiry.
    ///
    /// Concurrent callers on a cold cache may each fetch a token; the last
    /// writer wins.
    pub async fn access_token(&self) -> RedditResult<String> {
        if let Some(token) = self.token.lock().await.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        tracing::info!("Getting new Reddit OAuth token...");
        let response = self.request_token().await.map_err(|e| {
            tracing::error!("Failed to get Reddit OAuth token: {}", e);
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Reddit OAuth failed with status {}", status);
            return Err(RedditError::OAuth {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| RedditError::InvalidResponse(e.to_string()))?;

        let access_token = payload.access_token.ok_or_else(|| {
            RedditError::InvalidResponse(
                payload
                    .error
                    .unwrap_or_else(|| "No access token in Reddit OAuth response".to_string()),
            )
        })?;

        let lifetime =
            Duration::from_secs(payload.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS))
                .saturating_sub(TOKEN_SAFETY_MARGIN);

        *self.token.lock().await = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        tracing::info!("Reddit OAuth token obtained successfully");
        Ok(access_token)
    }

    /// Drop the cached token, e.g. after the API rejects it with 401.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    /// Request a fresh token without touching the cache and report what
    /// happened.
    pub async fn probe(&self) -> OAuthProbe {
        tracing::info!("Testing Reddit OAuth token acquisition...");

        if self.credentials().is_err() {
            return OAuthProbe {
                success: false,
                message: "Missing Reddit credentials in environment variables".to_string(),
                details: Some(json!({
                    "hasClientId": self.config.client_id.is_some(),
                    "hasClientSecret": self.config.client_secret.is_some(),
                })),
            };
        }

        let response = match self.request_token().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("OAuth test failed with error: {}", e);
                return OAuthProbe {
                    success: false,
                    message: "OAuth test failed with error".to_string(),
                    details: Some(json!({ "errorMessage": e.to_string() })),
                };
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::info!("Reddit OAuth response status: {}", status);

        if !status.is_success() {
            return OAuthProbe {
                success: false,
                message: format!("Reddit OAuth failed with status {}", status.as_u16()),
                details: Some(json!({
                    "status": status.as_u16(),
                    "statusText": status.canonical_reason().unwrap_or_default(),
                    "responseBody": body,
                })),
            };
        }

        let payload: TokenResponse = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(e) => {
                return OAuthProbe {
                    success: false,
                    message: "Failed to parse Reddit OAuth response as JSON".to_string(),
                    details: Some(json!({ "responseBody": body, "parseError": e.to_string() })),
                };
            }
        };

        match payload.access_token.as_deref() {
            Some(token) => OAuthProbe {
                success: true,
                message: "Reddit OAuth token obtained successfully".to_string(),
                details: Some(json!({
                    "tokenType": payload.token_type,
                    "expiresIn": payload.expires_in,
                    "scope": payload.scope,
                    "tokenLength": token.len(),
                })),
            },
            None => OAuthProbe {
                success: false,
                message: "No access token in Reddit OAuth response".to_string(),
                details: serde_json::to_value(&payload).ok(),
            },
        }
    }
}
