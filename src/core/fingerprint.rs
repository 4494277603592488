//! Weekly occupancy fingerprints.
//!
//! A fingerprint is a fixed 7x24 heatmap of a station's occupancy over the
//! 7-day window ending at the most recent midnight before the reference
//! time. As the reference advances a day, the window rolls forward exactly
//! one day. Cells with thin telemetry are flagged via the coverage ratio so
//! the ranking never promotes an hour the fleet barely reported in.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::core::intervals::status_intervals;
use crate::db::history;
use crate::errors::AppResult;
use crate::models::metrics::{Totals, UtilizationMetrics};
use crate::models::status::{is_active_charging, is_occupied, is_unavailable};
use crate::utils::time::{seconds_between, truncate_to_day, truncate_to_hour};

/// Minimum monitored seconds for a cell to be rankable.
const RANKABLE_MONITORED_SECONDS: f64 = 900.0;
/// Minimum coverage ratio for a cell to be rankable.
const RANKABLE_COVERAGE: f64 = 0.25;
/// How many cells the busiest/quietest rankings keep.
const RANKING_SIZE: usize = 5;

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One hour-of-week bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintCell {
    pub weekday: u32,
    pub hour: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub metrics: UtilizationMetrics,
    pub coverage_ratio: f64,
    pub label: String,
}

/// A cell reference in the busiest/quietest rankings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCell {
    pub weekday: u32,
    pub hour: u32,
    pub label: String,
    pub occupation_utilization_pct: f64,
    pub coverage_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationFingerprint {
    pub location_id: Option<String>,
    pub station_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub generated: DateTime<Utc>,
    pub port_count: usize,
    pub cells: Vec<FingerprintCell>,
    pub busiest: Vec<RankedCell>,
    pub quietest: Vec<RankedCell>,
}

/// The 7-day window ending at the most recent midnight before `reference`.
pub fn fingerprint_range(reference: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = truncate_to_day(reference);
    (midnight - Duration::days(7), midnight)
}

fn weekday_label(weekday: u32, hour: u32) -> String {
    format!("{} {:02}:00", WEEKDAY_NAMES[(weekday % 7) as usize], hour)
}

/// Compute the weekly occupancy heatmap for one station.
///
/// Returns None when the station has no history inside the window; that is
/// a "no data" answer, not an error.
pub fn station_fingerprint(
    conn: &Connection,
    location_id: Option<&str>,
    station_id: Option<&str>,
    reference: DateTime<Utc>,
) -> AppResult<Option<StationFingerprint>> {
    let (start, end) = fingerprint_range(reference);
    let station_history =
        history::station_history_between(conn, location_id, station_id, start, end)?;
    if station_history.is_empty() {
        return Ok(None);
    }

    let generated = Utc::now();

    // Spread every interval segment over the clock-hour buckets it overlaps.
    let mut buckets: HashMap<DateTime<Utc>, Totals> = HashMap::new();
    for samples in station_history.values() {
        for interval in status_intervals(samples, end) {
            if interval.end <= start || interval.start >= end {
                continue;
            }
            let seg_start = interval.start.max(start);
            let seg_end = interval.end.min(end);
            if seg_end <= seg_start {
                continue;
            }
            let status = interval.status.as_deref();
            let mut current = seg_start;
            while current < seg_end {
                let bucket_start = truncate_to_hour(current);
                let bucket_end = (bucket_start + Duration::hours(1)).min(seg_end);
                if bucket_end <= current {
                    break;
                }
                let duration = seconds_between(current, bucket_end);
                let totals = buckets.entry(bucket_start).or_default();
                totals.monitored_seconds += duration;
                if status.is_some() && !is_unavailable(status) {
                    totals.available_seconds += duration;
                }
                if is_occupied(status) {
                    totals.occupied_seconds += duration;
                }
                if is_active_charging(status) {
                    totals.active_seconds += duration;
                }
                current = bucket_end;
            }
        }
    }

    let port_count = station_history
        .keys()
        .filter(|port| port.is_some())
        .count();
    let capacity_seconds = port_count as f64 * 3600.0;

    let mut cells = Vec::with_capacity(7 * 24);
    let mut current = start;
    while current < end {
        let bucket_end = current + Duration::hours(1);
        let totals = buckets.get(&current).cloned().unwrap_or_default();
        let metrics = totals.metrics();
        let coverage_ratio = if capacity_seconds > 0.0 {
            totals.monitored_seconds / capacity_seconds
        } else {
            0.0
        };
        let weekday = current.weekday().num_days_from_monday();
        let hour = current.hour();
        cells.push(FingerprintCell {
            weekday,
            hour,
            start: current,
            end: bucket_end,
            metrics,
            coverage_ratio,
            label: weekday_label(weekday, hour),
        });
        current = bucket_end;
    }

    let busiest = ranked_cells(&cells, true);
    let quietest = ranked_cells(&cells, false);

    Ok(Some(StationFingerprint {
        location_id: location_id.map(str::to_owned),
        station_id: station_id.map(str::to_owned),
        start,
        end,
        generated,
        port_count,
        cells,
        busiest,
        quietest,
    }))
}

fn ranked_cells(cells: &[FingerprintCell], descending: bool) -> Vec<RankedCell> {
    let mut rankable: Vec<&FingerprintCell> = cells
        .iter()
        .filter(|cell| {
            cell.metrics.monitored_seconds >= RANKABLE_MONITORED_SECONDS
                && cell.coverage_ratio >= RANKABLE_COVERAGE
        })
        .collect();
    rankable.sort_by(|a, b| {
        let ord = a
            .metrics
            .occupation_utilization_pct
            .partial_cmp(&b.metrics.occupation_utilization_pct)
            .unwrap_or(Ordering::Equal);
        if descending { ord.reverse() } else { ord }
    });
    rankable
        .into_iter()
        .take(RANKING_SIZE)
        .map(|cell| RankedCell {
            weekday: cell.weekday,
            hour: cell.hour,
            label: cell.label.clone(),
            occupation_utilization_pct: cell.metrics.occupation_utilization_pct,
            coverage_ratio: cell.coverage_ratio,
        })
        .collect()
}
