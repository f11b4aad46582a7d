mod config;
mod db;
mod earnings_routes;
mod embedded_frontend;
mod oauth_routes;
mod page_routes;
mod refresh_routes;
mod request_id;
mod security_headers;
mod sentiment_routes;
mod stock_routes;
mod wsb_routes;

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;

pub use config::ServerConfig;
pub use db::DashboardDb;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use earnings_agent::EarningsAgent;
use finnhub_client::{AlphaVantageClient, FinnhubClient, MarketBoard};
use reddit_client::{RedditClient, TradestieClient};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wsb_cache::{CacheStore, MemoryStore, RedisStore, WsbCache};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub finnhub: Option<FinnhubClient>,
    pub market: Option<MarketBoard>,
    pub alpha_vantage: Option<AlphaVantageClient>,
    pub reddit: RedditClient,
    pub wsb: WsbCache,
    pub agent: EarningsAgent,
    pub tradestie: TradestieClient,
    pub db: Option<DashboardDb>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

/// Handler error rendered as `{ success: false, error, message?, details? }`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
    message: Option<String>,
    details: Option<String>,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self {
            status,
            error,
            message: None,
            details: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {:#}", self.status, self.error);
        } else {
            tracing::warn!("Request rejected ({}): {}", self.status, self.error);
        }

        let mut body = json!({ "success": false, "error": self.error.to_string() });
        if let Some(message) = self.message {
            body["message"] = json!(message);
        }
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "stonks-dashboard",
        "cache": state.wsb.store().backend(),
        "database": state.db.is_some(),
        "finnhub": state.finnhub.is_some(),
        "alphaVantage": state.alpha_vantage.is_some(),
        "earningsAgent": state.agent.is_configured(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "http.request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health))
        .merge(refresh_routes::refresh_routes())
        .merge(wsb_routes::wsb_routes())
        .merge(stock_routes::stock_routes())
        .merge(oauth_routes::oauth_routes())
        .merge(earnings_routes::earnings_routes())
        .merge(sentiment_routes::sentiment_routes())
        .merge(page_routes::page_routes())
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(trace)
        .layer(cors_layer(&state.config.allowed_origins))
        .with_state(state)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json_logs = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("PANIC: {info}");
    }));
}

async fn connect_store(redis_url: Option<&str>) -> Arc<dyn CacheStore> {
    if let Some(url) = redis_url {
        match RedisStore::connect(url).await {
            Ok(store) => {
                tracing::info!("Connected to Redis post cache");
                return Arc::new(store);
            }
            Err(e) => tracing::warn!("Redis unavailable ({}), falling back to in-memory cache", e),
        }
    } else {
        tracing::warn!("REDIS_URL not set, using in-memory post cache");
    }
    Arc::new(MemoryStore::new())
}

/// Wire every integration from the environment.
pub async fn build_state(config: ServerConfig) -> anyhow::Result<AppState> {
    let finnhub = config.finnhub_api_key.clone().map(FinnhubClient::new);
    if finnhub.is_none() {
        tracing::warn!("FINNHUB_API_KEY not set; stock data requests will fail");
    }
    let market = finnhub
        .clone()
        .map(|client| MarketBoard::new(Arc::new(client)));
    let alpha_vantage = config.alpha_vantage_api_key.clone().map(AlphaVantageClient::new);

    let reddit = RedditClient::from_env();
    let store = connect_store(config.redis_url.as_deref()).await;
    let wsb = WsbCache::new(store, Arc::new(reddit.clone()), config.cache.clone());

    let agent = EarningsAgent::from_env();
    if !agent.is_configured() {
        tracing::warn!("OPENAI_API_KEY not set; earnings agent requests will fail");
    }

    let db = match config.database_url.as_deref() {
        Some(url) => Some(
            DashboardDb::connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL not set; transcripts and sentiment history are disabled");
            None
        }
    };

    Ok(AppState {
        config: Arc::new(config),
        finnhub,
        market,
        alpha_vantage,
        reddit,
        wsb,
        agent,
        tradestie: TradestieClient::new(),
        db,
    })
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let addr = config.bind_addr();
    let state = build_state(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Dashboard server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
