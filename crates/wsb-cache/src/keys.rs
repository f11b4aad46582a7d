//! Cache key names and lifetimes shared by the refresh job and readers.

use std::time::Duration;

pub const HOT_POSTS: &str = "wsb:hot_posts";
pub const LAST_UPDATED: &str = "wsb:last_updated";
pub const DAILY_COMMENTS: &str = "wsb:daily_comments";
pub const COMMENTS_UPDATED: &str = "wsb:comments_updated";

pub const POSTS_TTL: Duration = Duration::from_secs(86_400);
pub const COMMENTS_TTL: Duration = Duration::from_secs(14_400);
/// Comment sets older than this are refreshed in the background on read.
pub const COMMENTS_STALE_AFTER: Duration = Duration::from_secs(4 * 3600);
