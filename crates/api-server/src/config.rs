use anyhow::{Context, Result};
use std::env;
use wsb_cache::CacheSettings;

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    // Storage; both optional for local development
    pub redis_url: Option<String>,
    pub database_url: Option<String>,

    // Upstream market data
    pub finnhub_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,

    /// Bearer secret the scheduler sends to `GET /api/refresh-cache`.
    pub cron_secret: Option<String>,
    /// Comma-separated CORS origins; empty allows any origin.
    pub allowed_origins: Vec<String>,

    pub cache: CacheSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            redis_url: None,
            database_url: None,
            finnhub_api_key: None,
            alpha_vantage_api_key: None,
            cron_secret: None,
            allowed_origins: Vec::new(),
            cache: CacheSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("API_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("API_PORT must be a port number")?,
            redis_url: optional("REDIS_URL"),
            database_url: optional("DATABASE_URL"),
            finnhub_api_key: optional("FINNHUB_API_KEY"),
            alpha_vantage_api_key: optional("ALPHA_VANTAGE_API_KEY"),
            cron_secret: optional("CRON_SECRET"),
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            cache: CacheSettings::from_env(),
        };

        if config.cron_secret.is_none() {
            tracing::warn!(
                "CRON_SECRET not set; scheduled cache refresh requests will be rejected"
            );
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
