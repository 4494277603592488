//! Rule-based classification of problematic chargers.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::core::intervals::{StatusSample, session_durations};
use crate::db::history::{self, PortHistory};
use crate::errors::AppResult;
use crate::models::port_key::StationKey;
use crate::models::rules::Rules;
use crate::models::status::{is_session_active, is_unavailable};

/// A station flagged by at least one rule.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemStation {
    pub location_id: Option<String>,
    pub station_id: Option<String>,
    pub port_id: Option<String>,
    pub status: Option<String>,
    pub reason: String,
}

/// How many stations each rule flagged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleCounts {
    pub unused: usize,
    pub no_long: usize,
    pub unavailable: usize,
}

type StationPorts = HashMap<Option<String>, Vec<StatusSample>>;

fn group_by_station(history: PortHistory) -> HashMap<StationKey, StationPorts> {
    let mut stations: HashMap<StationKey, StationPorts> = HashMap::new();
    for (key, samples) in history {
        stations
            .entry(key.station())
            .or_default()
            .insert(key.port_id, samples);
    }
    stations
}

fn earliest_event(ports: &StationPorts) -> Option<DateTime<Utc>> {
    ports
        .values()
        .flat_map(|samples| samples.iter().map(|s| s.ts))
        .min()
}

/// Apply the classification rules to every station with history.
///
/// Each rule is gated on having at least its own window of history; a young
/// station is skipped by a rule rather than flagged, which keeps freshly
/// commissioned chargers out of the report. A device whose last status
/// change predates the window is still evaluated via its carried-in latest
/// sample, so a long-idle station cannot hide from the rules. A pre-fetched
/// `history` map can be supplied (clipped the same way) so trend lines can
/// re-run the classifier per time slice without re-querying storage.
pub fn analyze_chargers(
    conn: &Connection,
    rules: &Rules,
    now: DateTime<Utc>,
    history: Option<&PortHistory>,
) -> AppResult<(Vec<ProblemStation>, RuleCounts)> {
    let window = Duration::seconds((rules.max_window_days() * 86400.0) as i64);
    let earliest = now - window;

    let history: PortHistory = match history {
        Some(prefetched) => prefetched
            .iter()
            .filter_map(|(key, samples)| {
                let mut filtered: Vec<StatusSample> = samples
                    .iter()
                    .filter(|s| s.ts >= earliest && s.ts <= now)
                    .cloned()
                    .collect();
                // Carry in the last pre-window sample, as the fetch does.
                if let Some(carried) = samples
                    .iter()
                    .filter(|s| s.ts < earliest)
                    .max_by_key(|s| s.ts)
                    && filtered.first().map(|s| carried.ts < s.ts).unwrap_or(true)
                {
                    filtered.insert(0, carried.clone());
                }
                (!filtered.is_empty()).then(|| (key.clone(), filtered))
            })
            .collect(),
        None => history::status_history_with_context(conn, earliest, Some(now))?,
    };

    let stations = group_by_station(history);

    let mut problematic = Vec::new();
    let mut counts = RuleCounts::default();

    for (station, ports) in &stations {
        let Some(earliest_ts) = earliest_event(ports) else {
            continue;
        };
        let history_span = now - earliest_ts;
        let mut reasons: Vec<String> = Vec::new();

        if history_span >= Duration::days(rules.unused_days) {
            let since_unused = now - Duration::days(rules.unused_days);
            let used_recently = ports.values().any(|samples| {
                samples
                    .iter()
                    .any(|s| is_session_active(s.status.as_deref()) && s.ts >= since_unused)
            });
            if !used_recently {
                reasons.push(format!("unused > {}d", rules.unused_days));
                counts.unused += 1;
            }
        }

        if history_span >= Duration::days(rules.long_session_days) {
            let since_long = now - Duration::days(rules.long_session_days);
            let has_long = ports.values().any(|samples| {
                let recent: Vec<StatusSample> = samples
                    .iter()
                    .filter(|s| s.ts >= since_long)
                    .cloned()
                    .collect();
                session_durations(&recent, now)
                    .iter()
                    .any(|d| *d >= rules.long_session_min)
            });
            if !has_long {
                reasons.push(format!(
                    "no session >= {}min in {}d",
                    rules.long_session_min, rules.long_session_days
                ));
                counts.no_long += 1;
            }
        }

        if history_span >= Duration::hours(rules.unavailable_hours) {
            let since_unavail = now - Duration::hours(rules.unavailable_hours);
            let all_unavail = !ports.is_empty()
                && ports.values().all(|samples| {
                    let Some(last) = samples.last() else {
                        return false;
                    };
                    if !is_unavailable(last.status.as_deref()) {
                        return false;
                    }
                    !samples
                        .iter()
                        .any(|s| s.ts >= since_unavail && !is_unavailable(s.status.as_deref()))
                });
            if all_unavail {
                reasons.push(format!("unavailable > {}h", rules.unavailable_hours));
                counts.unavailable += 1;
            }
        }

        if !reasons.is_empty() {
            problematic.push(ProblemStation {
                location_id: station.location_id.clone(),
                station_id: station.station_id.clone(),
                port_id: None,
                status: None,
                reason: reasons.join(", "),
            });
        }
    }

    Ok((problematic, counts))
}

/// Count stations with enough history that saw no usage in the last `days`.
pub fn count_unused_stations(
    conn: &Connection,
    days: i64,
    now: DateTime<Utc>,
    history: Option<&PortHistory>,
) -> AppResult<usize> {
    let history: PortHistory = match history {
        Some(prefetched) => prefetched
            .iter()
            .filter_map(|(key, samples)| {
                let filtered: Vec<StatusSample> = samples
                    .iter()
                    .filter(|s| s.ts <= now)
                    .cloned()
                    .collect();
                (!filtered.is_empty()).then(|| (key.clone(), filtered))
            })
            .collect(),
        None => history::all_history(conn)?,
    };

    let stations = group_by_station(history);
    let mut count = 0;
    for ports in stations.values() {
        let Some(earliest_ts) = earliest_event(ports) else {
            continue;
        };
        if now - earliest_ts < Duration::days(days) {
            continue;
        }
        let since_unused = now - Duration::days(days);
        let used_recently = ports.values().any(|samples| {
            samples
                .iter()
                .any(|s| is_session_active(s.status.as_deref()) && s.ts >= since_unused)
        });
        if !used_recently {
            count += 1;
        }
    }
    Ok(count)
}
