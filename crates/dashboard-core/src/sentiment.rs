//! Keyword-based headline sentiment.
//!
//! Good enough to tint a post card; not a model.

use serde::{Deserialize, Serialize};

const POSITIVE_WORDS: &[&str] = &[
    "upgrade", "beat", "beats", "surge", "rally", "gain", "gains", "growth", "profit",
    "bullish", "outperform", "strong", "record", "high", "buy", "boost", "rise",
    "jump", "soar", "breakout", "momentum", "moon", "rocket", "calls", "tendies",
    "squeeze", "printing", "green", "recovery",
];

const NEGATIVE_WORDS: &[&str] = &[
    "downgrade", "miss", "plunge", "crash", "loss", "losses", "decline", "bearish",
    "underperform", "weak", "low", "sell", "drop", "fall", "slump", "warning",
    "lawsuit", "fraud", "bankruptcy", "default", "layoff", "layoffs", "recession",
    "investigation", "puts", "rug", "red", "bagholder", "bagholding", "dump",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn from_text(text: &str) -> Self {
        let score = score_text(text);
        if score > 0.0 {
            Sentiment::Bullish
        } else if score < 0.0 {
            Sentiment::Bearish
        } else {
            Sentiment::Neutral
        }
    }
}

/// +1 per positive keyword, -1 per negative keyword.
pub fn score_text(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let mut score = 0.0f64;
    for w in lower.split_whitespace() {
        let clean: String = w.chars().filter(|c| c.is_alphanumeric()).collect();
        if POSITIVE_WORDS.contains(&clean.as_str()) {
            score += 1.0;
        }
        if NEGATIVE_WORDS.contains(&clean.as_str()) {
            score -= 1.0;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_text_counts_keywords() {
        assert_eq!(score_text("NVDA to the moon, calls printing!"), 3.0);
        assert_eq!(score_text("Bought puts before the crash"), -2.0);
        assert_eq!(score_text("What is everyone holding?"), 0.0);
    }

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(Sentiment::from_text("Massive rally today"), Sentiment::Bullish);
        assert_eq!(Sentiment::from_text("Another layoff warning"), Sentiment::Bearish);
        assert_eq!(Sentiment::from_text("Earnings thread"), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Neutral).unwrap(),
            "\"neutral\""
        );
    }
}
