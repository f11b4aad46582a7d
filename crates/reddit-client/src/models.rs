use dashboard_core::RedditPost;
use serde::{Deserialize, Serialize};

/// Token endpoint response. Reddit answers some failures with HTTP 200 and an
/// `error` field instead of a token, hence the optional fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData<T> {
    pub children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Thing<T> {
    pub data: T,
}

/// The subset of a link (`t3`) object the dashboard keeps.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub url: Option<String>,
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
}

const MAX_TITLE_CHARS: usize = 500;
pub(crate) const REDDIT_WEB: &str = "https://reddit.com";

pub(crate) fn truncate_chars(text: &str, max: usize) -> Option<String> {
    text.char_indices().nth(max).map(|(idx, _)| text[..idx].to_string())
}

impl LinkData {
    pub fn into_post(self, subreddit: &str) -> RedditPost {
        let title = truncate_chars(&self.title, MAX_TITLE_CHARS).unwrap_or(self.title);
        RedditPost {
            reddit_id: self.id,
            title,
            author: self
                .author
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| "[deleted]".to_string()),
            score: self.score,
            num_comments: self.num_comments,
            url: self.url.unwrap_or_default(),
            permalink: format!("{}{}", REDDIT_WEB, self.permalink),
            created_utc: self.created_utc,
            subreddit: subreddit.to_string(),
            top_comments: None,
        }
    }
}
