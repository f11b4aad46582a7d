use super::*;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request as HttpRequest;
use dashboard_core::{
    CompanyProfile, DashboardError, Quote, QuoteProvider, RedditComment, RedditPost,
};
use earnings_agent::AgentConfig;
use reddit_client::{RedditConfig, RedditError, RedditResult};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;
use wsb_cache::CacheSettings;

fn post(id: &str, title: &str, author: &str, score: i64) -> RedditPost {
    RedditPost {
        reddit_id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        score,
        num_comments: 4,
        url: format!("https://reddit.com/r/wallstreetbets/comments/{}/x/", id),
        permalink: format!("https://reddit.com/r/wallstreetbets/comments/{}/x/", id),
        created_utc: 1_748_937_600.0,
        subreddit: "wallstreetbets".to_string(),
        top_comments: None,
    }
}

#[derive(Default)]
struct StubReddit {
    posts: Vec<RedditPost>,
    fail: bool,
    listing_calls: AtomicUsize,
}

#[async_trait]
impl wsb_cache::PostSource for StubReddit {
    async fn hot_posts(&self) -> RedditResult<Vec<RedditPost>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RedditError::RetriesExhausted {
                attempts: 3,
                last: Box::new(RedditError::Status(503)),
            });
        }
        Ok(self.posts.clone())
    }

    async fn top_comments(&self, permalink: &str) -> RedditResult<Vec<RedditComment>> {
        Ok(vec![RedditComment {
            author: "degen".to_string(),
            body: "SPY 600 EOW".to_string(),
            score: 42,
            created_utc: 1_748_940_000.0,
            permalink: format!("{}c1/", permalink),
        }])
    }
}

/// Every ticker quotes at 100 except `fail_on`, which errors.
struct StubQuotes {
    fail_on: &'static str,
}

#[async_trait]
impl QuoteProvider for StubQuotes {
    async fn quote(&self, symbol: &str) -> Result<Quote, DashboardError> {
        if symbol == self.fail_on {
            return Err(DashboardError::ApiError("HTTP 502".to_string()));
        }
        Ok(Quote {
            c: 100.0,
            dp: Some(1.5),
            ..Quote::default()
        })
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, DashboardError> {
        Ok(CompanyProfile {
            ticker: Some(symbol.to_string()),
            ..CompanyProfile::default()
        })
    }
}

struct Harness {
    config: ServerConfig,
    source: Arc<StubReddit>,
    market: Option<MarketBoard>,
    db: Option<DashboardDb>,
}

impl Harness {
    fn new(source: StubReddit) -> Self {
        Self {
            config: ServerConfig::default(),
            source: Arc::new(source),
            market: None,
            db: None,
        }
    }

    fn state(&self) -> AppState {
        let reddit = RedditClient::new(RedditConfig {
            client_id: None,
            client_secret: None,
            ..RedditConfig::default()
        });
        AppState {
            config: Arc::new(self.config.clone()),
            finnhub: None,
            market: self.market.clone(),
            alpha_vantage: None,
            reddit,
            wsb: WsbCache::new(
                Arc::new(MemoryStore::new()),
                self.source.clone(),
                self.config.cache.clone(),
            ),
            agent: EarningsAgent::new(AgentConfig::default()),
            tradestie: TradestieClient::new(),
            db: self.db.clone(),
        }
    }
}

async fn send(
    app: &Router,
    request: HttpRequest<Body>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn get(uri: &str) -> HttpRequest<Body> {
    HttpRequest::get(uri).body(Body::empty()).unwrap()
}

fn sample_source() -> StubReddit {
    StubReddit {
        posts: vec![
            post("a1", "NVDA calls printing", "degen", 1500),
            post("d1", "Daily Discussion Thread for June 03, 2025", "AutoModerator", 300),
            post("a2", "Lost everything on puts", "bear", 6200),
        ],
        ..StubReddit::default()
    }
}

#[tokio::test]
async fn test_wsb_posts_without_cache_is_404() {
    let app = build_router(Harness::new(sample_source()).state());

    let (status, _, body) = send(&app, get("/api/wsb-posts")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No cached data available");
    assert_eq!(body["message"], "Trigger cache refresh first at /api/refresh-cache");
}

#[tokio::test]
async fn test_manual_refresh_then_listing() {
    let app = build_router(Harness::new(sample_source()).state());

    let refresh = HttpRequest::post("/api/refresh-cache").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, refresh).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["posts_processed"], 2);
    assert_eq!(body["data"]["cache_key"], "wsb:hot_posts");

    let (status, _, body) = send(&app, get("/api/wsb-posts")).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["data"]["posts"].as_array().unwrap();
    assert_eq!(posts[0]["id"], "a2");
    assert_eq!(posts[0]["flair"], "VIRAL");
    assert_eq!(posts[0]["rank"], 2);
    assert!(posts[0]["sentiment"].is_string());
    assert_eq!(posts[1]["id"], "a1");

    let threads = body["data"]["daily_threads"].as_array().unwrap();
    assert_eq!(threads[0]["flair"], "DAILY");
    assert_eq!(threads[0]["top_comments"][0]["body"], "SPY 600 EOW");
}

#[tokio::test]
async fn test_read_through_failure_is_503() {
    let mut harness = Harness::new(StubReddit {
        fail: true,
        ..StubReddit::default()
    });
    harness.config.cache = CacheSettings {
        read_through: true,
        ..CacheSettings::default()
    };
    let app = build_router(harness.state());

    let (status, _, body) = send(&app, get("/api/wsb-posts")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert!(body["details"].as_str().unwrap().contains("3 attempts"));
    assert_eq!(harness.source.listing_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scheduled_refresh_requires_cron_secret() {
    let mut harness = Harness::new(sample_source());
    harness.config.cron_secret = Some("cron-123".to_string());
    let app = build_router(harness.state());

    let (status, _, body) = send(&app, get("/api/refresh-cache")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(harness.source.listing_calls.load(Ordering::SeqCst), 0);

    let request = HttpRequest::get("/api/refresh-cache")
        .header("authorization", "Bearer cron-123")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(harness.source.listing_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stock_data_requires_symbol() {
    let mut harness = Harness::new(StubReddit::default());
    harness.market = Some(MarketBoard::new(Arc::new(StubQuotes { fail_on: "QQQ" })));
    let app = build_router(harness.state());

    let (status, _, body) = send(&app, get("/api/stock-data?type=profile")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Symbol parameter is required");
}

#[tokio::test]
async fn test_stock_quote_without_key_is_500() {
    let app = build_router(Harness::new(StubReddit::default()).state());

    let (status, _, body) = send(&app, get("/api/stock-data?symbol=AAPL")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "FINNHUB_API_KEY not found in environment variables");
}

#[tokio::test]
async fn test_indices_mark_only_failed_ticker() {
    let mut harness = Harness::new(StubReddit::default());
    harness.market = Some(MarketBoard::new(Arc::new(StubQuotes { fail_on: "QQQ" })));
    let app = build_router(harness.state());

    let (status, _, body) = send(&app, get("/api/stock-data?type=indices")).await;
    assert_eq!(status, StatusCode::OK);

    let indices = body["data"]["indices"].as_array().unwrap();
    assert_eq!(indices.len(), 4);
    for entry in indices {
        if entry["symbol"] == "QQQ" {
            assert_eq!(entry["error"], "Failed to fetch data");
            assert!(entry.get("data").is_none());
        } else {
            assert!(entry.get("error").is_none());
            assert_eq!(entry["data"]["c"], 100.0);
        }
    }
}

#[tokio::test]
async fn test_trending_sentiment_from_db() {
    let db = crate::db::memory_db().await;
    db.insert_sentiment(
        &[reddit_client::TickerSentiment {
            ticker: "GME".to_string(),
            sentiment: Some("Bullish".to_string()),
            sentiment_score: 0.31,
            no_of_comments: 88,
        }],
        chrono::Utc::now(),
    )
    .await
    .unwrap();

    let mut harness = Harness::new(StubReddit::default());
    harness.db = Some(db);
    let app = build_router(harness.state());

    let (status, _, body) = send(&app, get("/api/sentiment/trending")).await;
    assert_eq!(status, StatusCode::OK);
    let row = &body["data"][0];
    assert_eq!(row["symbol"], "GME");
    assert_eq!(row["mentions"], 88);
    assert_eq!(row["trend"], "bullish");
    assert_eq!(row["sentimentScore"], 0.31);
}

#[tokio::test]
async fn test_storage_routes_need_database() {
    let app = build_router(Harness::new(StubReddit::default()).state());

    let (status, _, _) = send(&app, get("/api/sentiment/trending")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _, _) = send(&app, get("/api/earnings-agent/transcripts")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_earnings_agent_without_key() {
    let app = build_router(Harness::new(StubReddit::default()).state());

    let request = HttpRequest::post("/api/earnings-agent")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"messages":[{"role":"user","content":"AMD Q2?"}]}"#))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error processing request");
    assert!(body["details"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn test_earnings_agent_rejects_malformed_json() {
    let app = build_router(Harness::new(StubReddit::default()).state());

    let request = HttpRequest::post("/api/earnings-agent")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_oauth_probe_without_credentials() {
    let app = build_router(Harness::new(StubReddit::default()).state());

    let (status, _, body) = send(&app, get("/api/test-reddit-oauth")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["hasClientId"], false);
}

#[tokio::test]
async fn test_health_and_response_headers() {
    let app = build_router(Harness::new(StubReddit::default()).state());

    let request = HttpRequest::get("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"], "memory");
    assert_eq!(body["database"], false);
    assert_eq!(headers["x-request-id"], "req-42");
    assert_eq!(headers["x-content-type-options"], "nosniff");

    let (_, headers, _) = send(&app, get("/api/wsb-posts")).await;
    assert_eq!(headers["cache-control"], "no-store");
    assert_eq!(headers["x-request-id"].len(), 36);
}
