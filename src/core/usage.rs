//! Per-location usage summaries and bucketed timelines.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::core::utilization::port_usage_between;
use crate::db::history::{self, LocationHistory};
use crate::errors::AppResult;
use crate::models::metrics::{Totals, UtilizationMetrics};

/// Lookback covers the week window plus a day of slack so interval
/// reconstruction has context before the window opens.
const LOOKBACK_DAYS: i64 = 8;

#[derive(Debug, Clone, Serialize)]
pub struct UsageBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub port_count: i64,
    #[serde(flatten)]
    pub metrics: UtilizationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_days: Option<i64>,
    pub timeline: Vec<UsageBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub day: UtilizationMetrics,
    pub week: UtilizationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationUsage {
    pub location_id: Option<String>,
    pub station_count: usize,
    pub port_count: usize,
    pub summary: UsageSummary,
    pub usage_day: UsageWindow,
    pub usage_week: UsageWindow,
    pub updated: DateTime<Utc>,
}

fn usage_timeline(
    location_history: &LocationHistory,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Vec<UsageBucket> {
    let mut timeline = Vec::new();
    let mut current = start;
    while current < end {
        let bucket_end = (current + step).min(end);
        let mut bucket_totals = Totals::default();
        for samples in location_history.values() {
            if let Some(totals) = port_usage_between(samples, current, bucket_end) {
                bucket_totals.accumulate(&totals);
            }
        }
        timeline.push(UsageBucket {
            start: current,
            end: bucket_end,
            port_count: bucket_totals.port_count as i64,
            metrics: bucket_totals.metrics(),
        });
        current = bucket_end;
    }
    timeline
}

/// Day and week usage for one location: summary metrics plus an hourly
/// timeline over the last 24 hours and a daily timeline over the last
/// 7 days. None when the location has no recent history.
pub fn location_usage(
    conn: &Connection,
    location_id: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<Option<LocationUsage>> {
    let lookback_start = now - Duration::days(LOOKBACK_DAYS);
    let location_history =
        history::recent_location_history(conn, location_id, lookback_start, Some(now))?;
    if location_history.is_empty() {
        return Ok(None);
    }

    let day_start = now - Duration::hours(24);
    let week_start = now - Duration::days(7);

    let mut day_totals = Totals::default();
    let mut week_totals = Totals::default();
    let mut station_ids: std::collections::HashSet<&Option<String>> =
        std::collections::HashSet::new();

    for ((station_id, _port_id), samples) in &location_history {
        station_ids.insert(station_id);
        if let Some(totals) = port_usage_between(samples, week_start, now) {
            week_totals.accumulate(&totals);
        }
        if let Some(totals) = port_usage_between(samples, day_start, now) {
            day_totals.accumulate(&totals);
        }
    }

    let day_timeline = usage_timeline(&location_history, day_start, now, Duration::hours(1));
    let week_timeline = usage_timeline(&location_history, week_start, now, Duration::days(1));

    Ok(Some(LocationUsage {
        location_id: location_id.map(str::to_owned),
        station_count: station_ids.iter().filter(|sid| sid.is_some()).count(),
        port_count: location_history.len(),
        summary: UsageSummary {
            day: day_totals.metrics(),
            week: week_totals.metrics(),
        },
        usage_day: UsageWindow {
            start: day_start,
            end: now,
            bucket_minutes: Some(60),
            bucket_days: None,
            timeline: day_timeline,
        },
        usage_week: UsageWindow {
            start: week_start,
            end: now,
            bucket_minutes: None,
            bucket_days: Some(1),
            timeline: week_timeline,
        },
        updated: now,
    }))
}
