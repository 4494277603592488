//! Interval and session reconstruction from discrete status samples.
//!
//! The store only keeps status *changes*, so a device's timeline is a sparse
//! sequence of `(ts, status)` samples. Each sample holds until the next one;
//! the last sample holds until the query end. Sessions are maximal IN_USE
//! runs derived from the same timeline.

use chrono::{DateTime, Utc};

use crate::models::status::is_session_active;
use crate::utils::time::minutes_between;

/// One observed status change for a device.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSample {
    pub ts: DateTime<Utc>,
    pub status: Option<String>,
}

impl StatusSample {
    pub fn new(ts: DateTime<Utc>, status: Option<String>) -> Self {
        Self { ts, status }
    }
}

/// A maximal span during which a device held one status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: Option<String>,
}

/// A closed usage session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_min: f64,
}

/// Convert a timeline into contiguous intervals clipped at `end`.
///
/// Samples are sorted by timestamp first; when two samples share an instant
/// (or arrive out of order) the later-inserted one wins. Zero and negative
/// length intervals are dropped, so the result tiles `[first_sample, end)`
/// without gaps or overlaps.
pub fn status_intervals(samples: &[StatusSample], end: DateTime<Utc>) -> Vec<StatusInterval> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut ordered: Vec<&StatusSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.ts);

    let mut intervals: Vec<StatusInterval> = Vec::new();
    let mut prev_ts = ordered[0].ts;
    let mut prev_status = ordered[0].status.clone();
    if prev_ts >= end {
        return Vec::new();
    }
    for sample in &ordered[1..] {
        if sample.ts <= prev_ts {
            // Same instant or out of order: the later write wins.
            prev_ts = sample.ts;
            prev_status = sample.status.clone();
            continue;
        }
        let segment_end = sample.ts.min(end);
        if segment_end > prev_ts {
            intervals.push(StatusInterval {
                start: prev_ts,
                end: segment_end,
                status: prev_status.clone(),
            });
        }
        prev_ts = sample.ts;
        prev_status = sample.status.clone();
        if prev_ts >= end {
            break;
        }
    }
    if prev_ts < end {
        intervals.push(StatusInterval {
            start: prev_ts,
            end,
            status: prev_status,
        });
    }
    intervals.retain(|iv| iv.end > iv.start);
    intervals
}

/// Session durations in minutes, including an in-progress session clipped at
/// `now`. Samples are expected in chronological order (as fetched).
pub fn session_durations(samples: &[StatusSample], now: DateTime<Utc>) -> Vec<f64> {
    let mut sessions = Vec::new();
    let mut start: Option<DateTime<Utc>> = None;
    for sample in samples {
        if is_session_active(sample.status.as_deref()) {
            if start.is_none() {
                start = Some(sample.ts);
            }
        } else if let Some(opened) = start.take() {
            sessions.push(minutes_between(opened, sample.ts));
        }
    }
    if let Some(opened) = start {
        sessions.push(minutes_between(opened, now));
    }
    sessions
}

/// Closed sessions only, with their bounds.
pub fn session_records(samples: &[StatusSample]) -> Vec<SessionRecord> {
    let mut sessions = Vec::new();
    let mut start: Option<DateTime<Utc>> = None;
    for sample in samples {
        if is_session_active(sample.status.as_deref()) {
            if start.is_none() {
                start = Some(sample.ts);
            }
        } else if let Some(opened) = start.take() {
            sessions.push(SessionRecord {
                start: opened,
                end: sample.ts,
                duration_min: minutes_between(opened, sample.ts),
            });
        }
    }
    sessions
}
