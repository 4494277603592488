//! Utilization aggregation: per-port totals and rollups up to station,
//! location, and network level.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::intervals::{StatusSample, session_durations, status_intervals};
use crate::db::history::PortHistory;
use crate::models::metrics::{Totals, UtilizationMetrics};
use crate::models::port_key::StationKey;
use crate::models::status::{is_active_charging, is_occupied, is_session_active, is_unavailable};
use crate::utils::time::seconds_between;

fn add_interval(totals: &mut Totals, status: Option<&str>, duration: f64) {
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
}

/// Totals for one port over its whole timeline clipped at `now`.
/// None when the timeline yields no monitored time.
pub fn port_utilization(samples: &[StatusSample], now: DateTime<Utc>) -> Option<Totals> {
    let intervals = status_intervals(samples, now);
    if intervals.is_empty() {
        return None;
    }
    let mut totals = Totals::default();
    for interval in &intervals {
        let duration = seconds_between(interval.start, interval.end);
        if duration <= 0.0 {
            continue;
        }
        add_interval(&mut totals, interval.status.as_deref(), duration);
    }
    if totals.monitored_seconds <= 0.0 {
        return None;
    }
    totals.sessions = session_durations(samples, now).len() as f64;
    totals.port_count = 1.0;
    Some(totals)
}

/// Totals for one port clipped to `[start, end)`.
///
/// The session count tracks in-session state carried in from before `start`,
/// so a session spanning the window opening is counted once, not missed.
pub fn port_usage_between(
    samples: &[StatusSample],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<Totals> {
    if samples.is_empty() || end <= start {
        return None;
    }
    let intervals = status_intervals(samples, end);
    let mut totals = Totals::default();
    for interval in &intervals {
        if interval.end <= start || interval.start >= end {
            continue;
        }
        let seg_start = interval.start.max(start);
        let seg_end = interval.end.min(end);
        if seg_end <= seg_start {
            continue;
        }
        let duration = seconds_between(seg_start, seg_end);
        if duration <= 0.0 {
            continue;
        }
        add_interval(&mut totals, interval.status.as_deref(), duration);
    }
    if totals.monitored_seconds <= 0.0 {
        return None;
    }

    let mut ordered: Vec<&StatusSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.ts);
    let mut in_session = false;
    let mut session_count = 0u32;
    for sample in ordered {
        let active = is_session_active(sample.status.as_deref());
        if sample.ts < start {
            if active {
                in_session = true;
            } else if in_session {
                session_count += 1;
                in_session = false;
            }
            continue;
        }
        if active {
            in_session = true;
        } else if in_session {
            session_count += 1;
            in_session = false;
        }
    }
    if in_session {
        session_count += 1;
    }

    totals.sessions = f64::from(session_count);
    totals.port_count = 1.0;
    Some(totals)
}

#[derive(Debug, Clone, Serialize)]
pub struct PortUtilizationRow {
    pub location_id: Option<String>,
    pub station_id: Option<String>,
    pub port_id: Option<String>,
    #[serde(flatten)]
    pub metrics: UtilizationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationUtilizationRow {
    pub location_id: Option<String>,
    pub station_id: Option<String>,
    pub port_count: i64,
    #[serde(flatten)]
    pub metrics: UtilizationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationUtilizationRow {
    pub location_id: Option<String>,
    pub station_count: usize,
    pub port_count: i64,
    #[serde(flatten)]
    pub metrics: UtilizationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkUtilization {
    pub port_count: i64,
    pub station_count: usize,
    pub location_count: usize,
    #[serde(flatten)]
    pub metrics: UtilizationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct UtilizationSummary {
    pub ports: Vec<PortUtilizationRow>,
    pub stations: Vec<StationUtilizationRow>,
    pub locations: Vec<LocationUtilizationRow>,
    pub network: NetworkUtilization,
}

/// Roll per-port totals up into station, location, and network views.
pub fn utilization_summary(history: &PortHistory, now: DateTime<Utc>) -> UtilizationSummary {
    let mut port_rows: Vec<PortUtilizationRow> = Vec::new();
    let mut station_totals: HashMap<StationKey, Totals> = HashMap::new();
    let mut location_totals: HashMap<Option<String>, Totals> = HashMap::new();
    let mut location_stations: HashMap<Option<String>, HashSet<Option<String>>> = HashMap::new();
    let mut network_totals = Totals::default();

    for (key, samples) in history {
        let Some(totals) = port_utilization(samples, now) else {
            continue;
        };
        port_rows.push(PortUtilizationRow {
            location_id: key.location_id.clone(),
            station_id: key.station_id.clone(),
            port_id: key.port_id.clone(),
            metrics: totals.metrics(),
        });

        station_totals
            .entry(key.station())
            .or_default()
            .accumulate(&totals);
        location_totals
            .entry(key.location_id.clone())
            .or_default()
            .accumulate(&totals);
        location_stations
            .entry(key.location_id.clone())
            .or_default()
            .insert(key.station_id.clone());
        network_totals.accumulate(&totals);
    }

    port_rows.sort_by(|a, b| {
        (&a.location_id, &a.station_id, &a.port_id).cmp(&(
            &b.location_id,
            &b.station_id,
            &b.port_id,
        ))
    });

    let station_count = station_totals.len();

    let mut station_rows: Vec<StationUtilizationRow> = station_totals
        .into_iter()
        .map(|(key, totals)| StationUtilizationRow {
            location_id: key.location_id,
            station_id: key.station_id,
            port_count: totals.port_count as i64,
            metrics: totals.metrics(),
        })
        .collect();
    station_rows.sort_by(|a, b| {
        (&a.location_id, &a.station_id).cmp(&(&b.location_id, &b.station_id))
    });

    let location_count = location_totals
        .keys()
        .filter(|loc| loc.is_some())
        .count();
    let mut location_rows: Vec<LocationUtilizationRow> = location_totals
        .into_iter()
        .map(|(location_id, totals)| {
            let stations = location_stations.get(&location_id);
            LocationUtilizationRow {
                station_count: stations
                    .map(|s| s.iter().filter(|sid| sid.is_some()).count())
                    .unwrap_or(0),
                port_count: totals.port_count as i64,
                metrics: totals.metrics(),
                location_id,
            }
        })
        .collect();
    location_rows.sort_by(|a, b| a.location_id.cmp(&b.location_id));

    let network = NetworkUtilization {
        port_count: network_totals.port_count as i64,
        station_count,
        location_count,
        metrics: network_totals.metrics(),
    };

    UtilizationSummary {
        ports: port_rows,
        stations: station_rows,
        locations: location_rows,
        network,
    }
}
