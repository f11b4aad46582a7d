//! Daily megathread detection.
//!
//! WSB alternates between "Daily Discussion Thread" during market hours and
//! "What Are Your Moves Tomorrow" after the close, both usually posted by
//! AutoModerator.

use dashboard_core::RedditPost;
use lazy_static::lazy_static;
use regex::Regex;

const AUTOMODERATOR: &str = "AutoModerator";

lazy_static! {
    static ref DATED_DAILY_THREAD: Regex =
        Regex::new(r"(?i)daily.*thread.*\d{1,2}[/\-.]\d{1,2}").expect("static regex");
}

pub fn is_daily_thread(title: &str, author: &str) -> bool {
    let title = title.to_lowercase();

    title.contains("daily discussion thread")
        || title.contains("what are your moves tomorrow")
        || title.contains("moves tomorrow")
        || (title.contains("daily discussion") && title.contains("thread"))
        || (author == AUTOMODERATOR
            && (title.contains("daily") || title.contains("moves tomorrow")))
        || DATED_DAILY_THREAD.is_match(&title)
}

/// Split a listing into `(regular posts, daily threads)`, preserving order.
pub fn partition_posts(posts: Vec<RedditPost>) -> (Vec<RedditPost>, Vec<RedditPost>) {
    let (daily, regular): (Vec<_>, Vec<_>) = posts
        .into_iter()
        .partition(|p| is_daily_thread(&p.title, &p.author));
    (regular, daily)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, author: &str) -> RedditPost {
        RedditPost {
            reddit_id: title.len().to_string(),
            title: title.to_string(),
            author: author.to_string(),
            score: 10,
            num_comments: 1,
            url: String::new(),
            permalink: String::new(),
            created_utc: 0.0,
            subreddit: "wallstreetbets".to_string(),
            top_comments: None,
        }
    }

    #[test]
    fn test_daily_discussion_any_case() {
        assert!(is_daily_thread("Daily Discussion Thread for March 04, 2025", "someone"));
        assert!(is_daily_thread("DAILY DISCUSSION THREAD", "someone"));
        assert!(is_daily_thread("daily discussion thread", "someone"));
    }

    #[test]
    fn test_off_hours_thread() {
        assert!(is_daily_thread("What Are Your Moves Tomorrow, March 05, 2025", "someone"));
        assert!(is_daily_thread("Weekend moves tomorrow?", "someone"));
    }

    #[test]
    fn test_automoderator_daily() {
        assert!(is_daily_thread("Daily Stock Picks", AUTOMODERATOR));
        assert!(!is_daily_thread("Daily Stock Picks", "regular_user"));
    }

    #[test]
    fn test_dated_thread_pattern() {
        assert!(is_daily_thread("Daily Earnings Thread 3/4", "someone"));
        assert!(is_daily_thread("daily gain thread 12-31", "someone"));
    }

    #[test]
    fn test_regular_posts_not_daily() {
        assert!(!is_daily_thread("NVDA calls printed, 400% gain", "degen"));
        assert!(!is_daily_thread("Thread about my daily losses", "degen"));
    }

    #[test]
    fn test_partition_preserves_order() {
        let posts = vec![
            post("GME to the moon", "a"),
            post("Daily Discussion Thread for June 3, 2025", AUTOMODERATOR),
            post("Loss porn", "b"),
            post("What Are Your Moves Tomorrow, June 3", AUTOMODERATOR),
        ];
        let (regular, daily) = partition_posts(posts);

        let regular: Vec<&str> = regular.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(regular, vec!["GME to the moon", "Loss porn"]);
        assert_eq!(daily.len(), 2);
        assert!(daily[0].title.starts_with("Daily Discussion Thread"));
    }
}
