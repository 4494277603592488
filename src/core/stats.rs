//! Dashboard statistics derived from stored history.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::core::intervals::{session_durations, session_records};
use crate::core::utilization::{UtilizationSummary, utilization_summary};
use crate::db::history::{self, StationHistory};
use crate::errors::AppResult;
use crate::models::port_key::StationKey;
use crate::models::record::PortRecord;
use crate::models::status::{is_session_active, is_unavailable};
use crate::utils::time::{minutes_between, truncate_to_day};

/// Sessions shorter than this count as "short" (likely failed charges).
pub const SHORT_SESSION_MAX_MIN: f64 = 3.0;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub chargers: usize,
    pub unavailable: usize,
    pub charging: usize,
    pub sessions: usize,
    pub short_sessions: usize,
    pub avg_session_min: f64,
    pub charges_today: usize,
    pub mttr_minutes: f64,
    pub utilization: UtilizationSummary,
}

/// Station outage durations in minutes.
///
/// A station is down while every port that ever reported has a current
/// status in the unavailable set; a port that has not reported yet keeps
/// the station up. The final open outage is clipped at `now`.
pub fn station_outage_durations(station_events: &StationHistory, now: DateTime<Utc>) -> Vec<f64> {
    let mut timeline: Vec<(DateTime<Utc>, &Option<String>, &Option<String>)> = Vec::new();
    for (port_id, samples) in station_events {
        for sample in samples {
            if sample.ts <= now {
                timeline.push((sample.ts, port_id, &sample.status));
            }
        }
    }
    if timeline.is_empty() {
        return Vec::new();
    }
    timeline.sort_by_key(|entry| entry.0);

    let mut statuses: HashMap<&Option<String>, Option<&String>> = station_events
        .iter()
        .filter(|(_, samples)| !samples.is_empty())
        .map(|(port_id, _)| (port_id, None))
        .collect();
    if statuses.is_empty() {
        return Vec::new();
    }

    let station_down = |statuses: &HashMap<&Option<String>, Option<&String>>| {
        statuses
            .values()
            .all(|status| matches!(status, Some(s) if is_unavailable(Some(s.as_str()))))
    };

    let mut durations = Vec::new();
    let mut current_down = station_down(&statuses);
    let mut down_start: Option<DateTime<Utc>> = None;

    let mut i = 0;
    while i < timeline.len() {
        let ts = timeline[i].0;
        let prev_down = current_down;
        while i < timeline.len() && timeline[i].0 == ts {
            statuses.insert(timeline[i].1, timeline[i].2.as_ref());
            i += 1;
        }
        current_down = station_down(&statuses);
        if prev_down && !current_down {
            if let Some(start) = down_start.take() {
                durations.push(minutes_between(start, ts));
            }
        } else if !prev_down && current_down {
            down_start = Some(ts);
        }
    }

    if current_down && let Some(start) = down_start {
        durations.push(minutes_between(start, now));
    }

    durations
}

/// Aggregate dashboard statistics from the store.
pub fn stats_from_db(conn: &Connection, now: DateTime<Utc>) -> AppResult<DashboardStats> {
    let latest = history::latest_records(conn)?;
    let (chargers, unavailable, charging) = status_counts(&latest);

    let full_history = history::all_history(conn)?;

    let mut sessions = 0;
    let mut short_sessions = 0;
    for samples in full_history.values() {
        let durations = session_durations(samples, now);
        sessions += durations.len();
        short_sessions += durations
            .iter()
            .filter(|d| **d < SHORT_SESSION_MAX_MIN)
            .count();
    }

    // Average over closed sessions started within the last 24 hours.
    let since = now - Duration::hours(24);
    let mut recent_durations: Vec<f64> = Vec::new();
    for samples in full_history.values() {
        for record in session_records(samples) {
            if record.start >= since {
                recent_durations.push(record.duration_min);
            }
        }
    }
    let avg_session_min = if recent_durations.is_empty() {
        0.0
    } else {
        recent_durations.iter().sum::<f64>() / recent_durations.len() as f64
    };

    let today = truncate_to_day(now);
    let mut charges_today = 0;
    for samples in full_history.values() {
        charges_today += session_records(samples)
            .iter()
            .filter(|record| record.start >= today)
            .count();
    }

    let mut station_histories: HashMap<StationKey, StationHistory> = HashMap::new();
    for (key, samples) in &full_history {
        station_histories
            .entry(key.station())
            .or_default()
            .insert(key.port_id.clone(), samples.clone());
    }
    let mut outage_durations: Vec<f64> = Vec::new();
    for station_events in station_histories.values() {
        outage_durations.extend(station_outage_durations(station_events, now));
    }
    let mttr_minutes = if outage_durations.is_empty() {
        0.0
    } else {
        outage_durations.iter().sum::<f64>() / outage_durations.len() as f64
    };

    let utilization = utilization_summary(&full_history, now);

    Ok(DashboardStats {
        chargers,
        unavailable,
        charging,
        sessions,
        short_sessions,
        avg_session_min,
        charges_today,
        mttr_minutes,
        utilization,
    })
}

/// Status counters over a set of latest records, without touching history.
pub fn status_counts(records: &[PortRecord]) -> (usize, usize, usize) {
    let chargers = records.len();
    let unavailable = records
        .iter()
        .filter(|r| is_unavailable(r.status.as_deref()))
        .count();
    let charging = records
        .iter()
        .filter(|r| is_session_active(r.status.as_deref()))
        .count();
    (chargers, unavailable, charging)
}
