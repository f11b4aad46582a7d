//! Relational storage for chat transcripts and WSB sentiment snapshots.
//!
//! Runs on SQLite or Postgres through `sqlx::AnyPool`. Timestamps are stored
//! as fixed-width RFC 3339 UTC text so they compare correctly as strings.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use reddit_client::TickerSentiment;
use serde::Serialize;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS chat_transcripts (
        id TEXT PRIMARY KEY,
        request_id TEXT,
        model TEXT NOT NULL,
        prompt TEXT NOT NULL,
        response TEXT NOT NULL,
        reasoning TEXT,
        has_pdf BIGINT NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_chat_transcripts_created ON chat_transcripts (created_at)",
    "CREATE TABLE IF NOT EXISTS reddit_sentiment (
        id TEXT PRIMARY KEY,
        symbol TEXT NOT NULL,
        sentiment_score DOUBLE PRECISION NOT NULL,
        sentiment_label TEXT,
        mention_count BIGINT NOT NULL,
        source TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        raw_data TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_reddit_sentiment_timestamp ON reddit_sentiment (timestamp)",
];

pub fn db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Transcript {
    pub id: String,
    pub request_id: Option<String>,
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub reasoning: Option<String>,
    pub has_pdf: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SentimentRow {
    pub symbol: String,
    pub sentiment_score: f64,
    pub sentiment_label: Option<String>,
    pub mention_count: i64,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct DashboardDb {
    pool: AnyPool,
}

impl DashboardDb {
    pub async fn connect(database_url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn save_transcript(&self, transcript: &Transcript) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_transcripts
                (id, request_id, model, prompt, response, reasoning, has_pdf, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&transcript.id)
        .bind(&transcript.request_id)
        .bind(&transcript.model)
        .bind(&transcript.prompt)
        .bind(&transcript.response)
        .bind(&transcript.reasoning)
        .bind(transcript.has_pdf)
        .bind(&transcript.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_transcripts(&self, limit: i64) -> Result<Vec<Transcript>> {
        let rows = sqlx::query_as::<_, Transcript>(
            "SELECT id, request_id, model, prompt, response, reasoning, has_pdf, created_at
             FROM chat_transcripts
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Append one snapshot row per ticker. Returns the number written.
    pub async fn insert_sentiment(
        &self,
        rows: &[TickerSentiment],
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let timestamp = db_timestamp(at);
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO reddit_sentiment
                    (id, symbol, sentiment_score, sentiment_label, mention_count,
                     source, timestamp, raw_data)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&row.ticker)
            .bind(row.sentiment_score)
            .bind(&row.sentiment)
            .bind(row.no_of_comments)
            .bind("wallstreetbets")
            .bind(&timestamp)
            .bind(serde_json::to_string(row)?)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    /// Rows recorded at or after `since`, most-mentioned first.
    pub async fn trending_since(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SentimentRow>> {
        let rows = sqlx::query_as::<_, SentimentRow>(
            "SELECT symbol, sentiment_score, sentiment_label, mention_count, timestamp
             FROM reddit_sentiment
             WHERE timestamp >= $1
             ORDER BY mention_count DESC
             LIMIT $2",
        )
        .bind(db_timestamp(since))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) async fn memory_db() -> DashboardDb {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory SQLite");
    let db = DashboardDb::from_pool(pool);
    db.init_schema().await.expect("schema");
    db
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticker(symbol: &str, score: f64, comments: i64) -> TickerSentiment {
        TickerSentiment {
            ticker: symbol.to_string(),
            sentiment: Some(if score > 0.0 { "Bullish" } else { "Bearish" }.to_string()),
            sentiment_score: score,
            no_of_comments: comments,
        }
    }

    #[tokio::test]
    async fn test_trending_orders_by_mentions_within_window() {
        let db = memory_db().await;
        let now = Utc::now();

        db.insert_sentiment(&[ticker("OLD", 0.5, 999)], now - Duration::hours(30))
            .await
            .unwrap();
        db.insert_sentiment(&[ticker("GME", 0.2, 140), ticker("TSLA", -0.1, 300)], now)
            .await
            .unwrap();

        let rows = db.trending_since(now - Duration::hours(24), 50).await.unwrap();
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["TSLA", "GME"]);
        assert_eq!(rows[0].sentiment_label.as_deref(), Some("Bearish"));
    }

    #[tokio::test]
    async fn test_transcripts_newest_first() {
        let db = memory_db().await;
        for (i, prompt) in ["first", "second"].iter().enumerate() {
            db.save_transcript(&Transcript {
                id: format!("t{}", i),
                request_id: None,
                model: "o3".to_string(),
                prompt: prompt.to_string(),
                response: "ok".to_string(),
                reasoning: None,
                has_pdf: 0,
                created_at: db_timestamp(Utc::now() + Duration::seconds(i as i64)),
            })
            .await
            .unwrap();
        }

        let rows = db.recent_transcripts(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prompt, "second");
    }
}
