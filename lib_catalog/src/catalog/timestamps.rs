//! Term window timestamp parsing.
//!
//! Upstream timestamps look like `2024-01-01T00:00:00Z`. The final character
//! (the zone marker) is dropped and the rest is read as a naive local
//! date-time, so comparisons happen against naive "now".

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// A term window bound that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Nothing left to parse after dropping the zone marker.
    #[error("Invalid isoformat string: empty timestamp")]
    Empty,

    /// Not an ISO-8601 date or date-time.
    #[error("Invalid isoformat string: '{0}'")]
    Invalid(String),
}

/// `raw` without its final character.
fn drop_zone_marker(raw: &str) -> &str {
    let mut chars = raw.chars();
    chars.next_back();
    chars.as_str()
}

/// Parses an ISO-8601 date-time (`T` or space separated, optional fraction,
/// optional seconds) or a bare date (read as midnight).
pub fn parse_iso_naive(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a `startDateTime`/`endDateTime` value. A missing value behaves like
/// an empty string and fails.
pub fn parse_term_timestamp(raw: Option<&str>) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = drop_zone_marker(raw.unwrap_or_default());
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }
    parse_iso_naive(trimmed).ok_or_else(|| TimestampError::Invalid(trimmed.to_string()))
}

/// Inclusive containment test: `start <= now <= end`.
pub fn window_contains(start: NaiveDateTime, end: NaiveDateTime, now: NaiveDateTime) -> bool {
    start <= now && now <= end
}
