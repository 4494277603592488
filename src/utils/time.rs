//! Time utilities: RFC3339 parsing/formatting for stored rows, bucket
//! truncation, float second/minute spans.
//!
//! All timestamps are handled in UTC and stored as RFC3339 text with a fixed
//! precision so the lexicographic order of the `ts` column matches the
//! chronological order.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Timelike, Utc};

/// Format a timestamp for storage and query parameters.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. Returns None on malformed input; callers decide
/// whether to skip the row or surface an error.
pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

pub fn truncate_to_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    match ts.date_naive().and_hms_opt(0, 0, 0) {
        Some(naive) => Utc.from_utc_datetime(&naive),
        None => ts,
    }
}

/// Floor a timestamp to a slot of `slot_seconds` since the epoch.
pub fn truncate_to_slot(ts: DateTime<Utc>, slot_seconds: i64) -> DateTime<Utc> {
    let secs = ts.timestamp().div_euclid(slot_seconds) * slot_seconds;
    Utc.timestamp_opt(secs, 0).single().unwrap_or(ts)
}

/// Span between two instants in fractional seconds.
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    duration_seconds(end - start)
}

/// Span between two instants in fractional minutes.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    seconds_between(start, end) / 60.0
}

pub fn duration_seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}
