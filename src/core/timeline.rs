//! Fleet history in 15-minute slots, for rendering trend lines.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::core::analyze::{analyze_chargers, count_unused_stations};
use crate::db::history;
use crate::errors::AppResult;
use crate::models::rules::Rules;
use crate::models::status::{is_session_active, is_unavailable};
use crate::utils::time::truncate_to_slot;

const SLOT_SECONDS: i64 = 900;
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct TimelineSlot {
    pub ts: DateTime<Utc>,
    pub chargers: usize,
    pub unavailable: usize,
    pub charging: usize,
    pub problematic: usize,
    pub unused_1: usize,
    pub unused_2: usize,
    pub unused_7: usize,
}

/// Snapshot the fleet state at every 15-minute slot that saw events in the
/// last 7 days. The history fetch is padded by the rules' largest window so
/// the classifier has enough context at the oldest slots.
pub fn timeline_stats(conn: &Connection, rules: &Rules) -> AppResult<Vec<TimelineSlot>> {
    let now = Utc::now();
    let since = now - Duration::days(LOOKBACK_DAYS);
    let padding = Duration::seconds((rules.max_window_days() * 86400.0) as i64);
    let full_history = history::recent_status_history(conn, since - padding, None)?;

    let slots: BTreeSet<DateTime<Utc>> = full_history
        .values()
        .flat_map(|samples| samples.iter().map(|s| s.ts))
        .filter(|ts| *ts >= since)
        .map(|ts| truncate_to_slot(ts, SLOT_SECONDS))
        .collect();

    let mut result = Vec::with_capacity(slots.len());
    for slot_ts in slots {
        let slot_end = slot_ts + Duration::seconds(SLOT_SECONDS);

        let mut chargers = 0;
        let mut unavailable = 0;
        let mut charging = 0;
        for samples in full_history.values() {
            let mut status: Option<&Option<String>> = None;
            for sample in samples {
                if sample.ts <= slot_end {
                    status = Some(&sample.status);
                } else {
                    break;
                }
            }
            let Some(status) = status else {
                continue;
            };
            chargers += 1;
            if is_unavailable(status.as_deref()) {
                unavailable += 1;
            }
            if is_session_active(status.as_deref()) {
                charging += 1;
            }
        }

        let (problematic, _) = analyze_chargers(conn, rules, slot_end, Some(&full_history))?;

        result.push(TimelineSlot {
            ts: slot_ts,
            chargers,
            unavailable,
            charging,
            problematic: problematic.len(),
            unused_1: count_unused_stations(conn, 1, slot_end, Some(&full_history))?,
            unused_2: count_unused_stations(conn, 2, slot_end, Some(&full_history))?,
            unused_7: count_unused_stations(conn, 7, slot_end, Some(&full_history))?,
        });
    }
    Ok(result)
}
