//! Timestamp formatting for CLI output.

use chrono::{DateTime, Local};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_local(ts: &DateTime<Local>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

/// Shorten a stored RFC 3339 timestamp for display; unparsable input is
/// returned unchanged.
pub fn display_rfc3339(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| format_local(&dt.with_timezone(&Local)))
        .unwrap_or_else(|_| raw.to_string())
}
