//! Recent sessions per charger and session-count time series.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::core::intervals::session_records;
use crate::db::history;
use crate::db::retention::MEDIUM_DETAIL_DAYS;
use crate::errors::{AppError, AppResult};
use crate::models::status::is_session_active;
use crate::utils::time::{truncate_to_day, truncate_to_hour};

#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: f64,
}

/// Recent closed sessions per port of one station, newest first, trimmed to
/// `limit` per port. Looks back over the hourly-detail retention window.
pub fn charger_sessions(
    conn: &Connection,
    location_id: Option<&str>,
    station_id: Option<&str>,
    limit: usize,
) -> AppResult<HashMap<Option<String>, Vec<SessionEntry>>> {
    let now = Utc::now();
    let since = now - Duration::days(MEDIUM_DETAIL_DAYS);
    let station_history =
        history::station_history_between(conn, location_id, station_id, since, now)?;

    let mut result = HashMap::new();
    for (port, samples) in station_history {
        if samples.is_empty() {
            continue;
        }
        let mut sessions = session_records(&samples);
        sessions.sort_by(|a, b| b.start.cmp(&a.start));
        sessions.truncate(limit);
        result.insert(
            port,
            sessions
                .into_iter()
                .map(|record| SessionEntry {
                    start: record.start,
                    end: record.end,
                    duration: record.duration_min,
                })
                .collect(),
        );
    }
    Ok(result)
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sessions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySessions {
    pub day: NaiveDate,
    pub sessions: i64,
}

/// Count session starts per bucket over the last `days` days.
///
/// `granularity` must be `"day"` or `"hour"`; anything else is rejected
/// with an invalid-argument error rather than silently defaulted. The
/// resulting range is continuous, with zero-session buckets filled in.
pub fn sessions_time_series(
    conn: &Connection,
    days: i64,
    granularity: &str,
) -> AppResult<Vec<SeriesBucket>> {
    let granularity = granularity.to_lowercase();
    let hourly = match granularity.as_str() {
        "hour" => true,
        "day" => false,
        other => return Err(AppError::InvalidGranularity(other.to_string())),
    };

    let now = Utc::now();
    let since = if hourly {
        truncate_to_hour(now - Duration::days(days))
    } else {
        now - Duration::days(days)
    };
    let full_history = history::recent_status_history(conn, since, None)?;

    let bucket_start = |ts: DateTime<Utc>| {
        if hourly {
            truncate_to_hour(ts)
        } else {
            truncate_to_day(ts)
        }
    };

    // A session starts at each transition into IN_USE.
    let mut counts: HashMap<DateTime<Utc>, i64> = HashMap::new();
    for samples in full_history.values() {
        let mut last_active = false;
        for sample in samples {
            let active = is_session_active(sample.status.as_deref());
            if active && !last_active && sample.ts >= since {
                *counts.entry(bucket_start(sample.ts)).or_insert(0) += 1;
            }
            last_active = active;
        }
    }

    let mut result = Vec::new();
    if hourly {
        let end = truncate_to_hour(now);
        let mut current = truncate_to_hour(now - Duration::days(days));
        while current <= end {
            result.push(SeriesBucket {
                start: current,
                end: current + Duration::hours(1),
                sessions: counts.get(&current).copied().unwrap_or(0),
            });
            current += Duration::hours(1);
        }
    } else {
        for i in (0..days).rev() {
            let day_start = truncate_to_day(now - Duration::days(i));
            result.push(SeriesBucket {
                start: day_start,
                end: day_start + Duration::days(1),
                sessions: counts.get(&day_start).copied().unwrap_or(0),
            });
        }
    }
    Ok(result)
}

/// Daily session counts for the last `days` days.
pub fn sessions_per_day(conn: &Connection, days: i64) -> AppResult<Vec<DailySessions>> {
    let series = sessions_time_series(conn, days, "day")?;
    Ok(series
        .into_iter()
        .map(|bucket| DailySessions {
            day: bucket.start.date_naive(),
            sessions: bucket.sessions,
        })
        .collect())
}
