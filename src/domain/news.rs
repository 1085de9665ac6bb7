//! News posts and their display rules.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

/// Image recorded for posts created without an upload.
pub const DEFAULT_IMAGE: &str = "default.jpg";

/// Number of characters kept from the long-form timestamp in show/delete views.
pub const DISPLAY_DATE_LEN: usize = 15;

const LONG_DATE_FORMAT: &str = "%a %b %d %Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct NewsRecord {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub image: String,
    pub created_at: OffsetDateTime,
}

/// Render the truncated creation date shown next to a single post, e.g. `Mon Jan 06 2025`.
pub fn display_date(created_at: OffsetDateTime, tz: Tz) -> String {
    let long = localized(created_at, tz).format(LONG_DATE_FORMAT).to_string();
    long.chars().take(DISPLAY_DATE_LEN).collect()
}

fn localized(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    DateTime::<Utc>::from_timestamp(utc.unix_timestamp(), utc.nanosecond())
        .unwrap_or_default()
        .with_timezone(&tz)
}
