//! History fetchers: status timelines grouped by device, plus latest-status
//! views. Rows with unparseable timestamps are logged and skipped; malformed
//! rows from older schema versions must never make analytics fatal.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::core::intervals::StatusSample;
use crate::errors::AppResult;
use crate::models::port_key::PortKey;
use crate::models::record::PortRecord;
use crate::utils::time::{fmt_ts, parse_ts};

/// Status timelines keyed by device.
pub type PortHistory = HashMap<PortKey, Vec<StatusSample>>;

/// Status timelines for one location, keyed by (station_id, port_id).
pub type LocationHistory = HashMap<(Option<String>, Option<String>), Vec<StatusSample>>;

/// Status timelines for one station, keyed by port_id.
pub type StationHistory = HashMap<Option<String>, Vec<StatusSample>>;

fn push_sample(
    timeline: &mut Vec<StatusSample>,
    row_ts: &str,
    status: Option<String>,
) -> bool {
    match parse_ts(row_ts) {
        Some(ts) => {
            timeline.push(StatusSample::new(ts, status));
            true
        }
        None => {
            debug!(ts = %row_ts, "unparseable timestamp, skipping row");
            false
        }
    }
}

/// Full status history per device since `since` (inclusive), optionally
/// bounded by `until` (inclusive). Timelines come back in chronological
/// order.
pub fn recent_status_history(
    conn: &Connection,
    since: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> AppResult<PortHistory> {
    let mut sql = String::from(
        "SELECT location_id, station_id, port_id, ts, status FROM port_status WHERE ts >= ?",
    );
    let mut bind: Vec<String> = vec![fmt_ts(since)];
    if let Some(until) = until {
        sql.push_str(" AND ts <= ?");
        bind.push(fmt_ts(until));
    }
    sql.push_str(" ORDER BY location_id, station_id, port_id, ts");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind.iter()), |row| {
        Ok((
            PortKey::new(row.get(0)?, row.get(1)?, row.get(2)?),
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut history: PortHistory = HashMap::new();
    for row in rows {
        let (key, ts_text, status) = row?;
        push_sample(history.entry(key).or_default(), &ts_text, status);
    }
    history.retain(|_, timeline| !timeline.is_empty());
    Ok(history)
}

/// Like [`recent_status_history`] but restricted to one location and keyed
/// by (station, port).
pub fn recent_location_history(
    conn: &Connection,
    location_id: Option<&str>,
    since: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> AppResult<LocationHistory> {
    let mut sql = String::from(
        "SELECT station_id, port_id, ts, status FROM port_status
         WHERE location_id IS ? AND ts >= ?",
    );
    let mut bind: Vec<Option<String>> =
        vec![location_id.map(str::to_owned), Some(fmt_ts(since))];
    if let Some(until) = until {
        sql.push_str(" AND ts <= ?");
        bind.push(Some(fmt_ts(until)));
    }
    sql.push_str(" ORDER BY station_id, port_id, ts");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind.iter()), |row| {
        Ok((
            (
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
            ),
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut history: LocationHistory = HashMap::new();
    for row in rows {
        let (key, ts_text, status) = row?;
        push_sample(history.entry(key).or_default(), &ts_text, status);
    }
    history.retain(|_, timeline| !timeline.is_empty());
    Ok(history)
}

/// Like [`recent_status_history`] but with, per device, the latest sample
/// from before `since` prepended. Change-only storage means an idle device
/// may have no row inside the window at all; the carried-in sample keeps it
/// visible with its standing status.
pub fn status_history_with_context(
    conn: &Connection,
    since: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> AppResult<PortHistory> {
    let mut history = recent_status_history(conn, since, until)?;

    let mut stmt = conn.prepare_cached(
        "SELECT ps.location_id, ps.station_id, ps.port_id, ps.ts, ps.status
         FROM port_status ps
         JOIN (
             SELECT location_id, station_id, port_id, MAX(ts) AS max_ts
             FROM port_status
             WHERE ts < ?1
             GROUP BY location_id, station_id, port_id
         ) latest
           ON ps.location_id IS latest.location_id
          AND ps.station_id IS latest.station_id
          AND ps.port_id IS latest.port_id
          AND ps.ts = latest.max_ts",
    )?;
    let rows = stmt.query_map([fmt_ts(since)], |row| {
        Ok((
            PortKey::new(row.get(0)?, row.get(1)?, row.get(2)?),
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;
    for row in rows {
        let (key, ts_text, status) = row?;
        let Some(ts) = parse_ts(&ts_text) else {
            debug!(ts = %ts_text, "unparseable timestamp, skipping row");
            continue;
        };
        let timeline = history.entry(key).or_default();
        if timeline.first().map(|s| ts < s.ts).unwrap_or(true) {
            timeline.insert(0, StatusSample::new(ts, status));
        }
    }
    Ok(history)
}

/// All known ports for a station, including ports only seen before `start`.
pub fn distinct_station_ports(
    conn: &Connection,
    location_id: Option<&str>,
    station_id: Option<&str>,
) -> AppResult<Vec<Option<String>>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT port_id FROM port_status
         WHERE location_id IS ?1 AND station_id IS ?2",
    )?;
    let rows = stmt.query_map(params![location_id, station_id], |row| row.get(0))?;
    let mut ports = Vec::new();
    for port in rows {
        ports.push(port?);
    }
    Ok(ports)
}

/// Status history for one station inside `[start, end)`.
///
/// Each port additionally gets its latest sample from before `start`
/// prepended, so interval reconstruction covers the window opening instead
/// of starting blind at the first in-window event.
pub fn station_history_between(
    conn: &Connection,
    location_id: Option<&str>,
    station_id: Option<&str>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<StationHistory> {
    let mut history: StationHistory = HashMap::new();
    for port in distinct_station_ports(conn, location_id, station_id)? {
        history.insert(port, Vec::new());
    }
    if history.is_empty() {
        return Ok(history);
    }

    let mut stmt = conn.prepare_cached(
        "SELECT port_id, ts, status FROM port_status
         WHERE location_id IS ?1 AND station_id IS ?2 AND ts >= ?3 AND ts < ?4
         ORDER BY port_id, ts",
    )?;
    let rows = stmt.query_map(
        params![location_id, station_id, fmt_ts(start), fmt_ts(end)],
        |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        },
    )?;
    for row in rows {
        let (port, ts_text, status) = row?;
        push_sample(history.entry(port).or_default(), &ts_text, status);
    }

    // Carry in the last status each port reported before the window.
    let mut stmt = conn.prepare_cached(
        "SELECT ps.port_id, ps.ts, ps.status
         FROM port_status ps
         JOIN (
             SELECT port_id, MAX(ts) AS max_ts
             FROM port_status
             WHERE location_id IS ?1 AND station_id IS ?2 AND ts < ?3
             GROUP BY port_id
         ) latest
           ON ps.port_id IS latest.port_id AND ps.ts = latest.max_ts
         WHERE ps.location_id IS ?1 AND ps.station_id IS ?2",
    )?;
    let rows = stmt.query_map(
        params![location_id, station_id, fmt_ts(start)],
        |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        },
    )?;
    for row in rows {
        let (port, ts_text, status) = row?;
        let Some(ts) = parse_ts(&ts_text) else {
            debug!(ts = %ts_text, "unparseable timestamp, skipping row");
            continue;
        };
        let timeline = history.entry(port).or_default();
        if timeline.first().map(|s| ts < s.ts).unwrap_or(true) {
            timeline.insert(0, StatusSample::new(ts, status));
        }
    }

    Ok(history)
}

/// Complete stored history per device.
pub fn all_history(conn: &Connection) -> AppResult<PortHistory> {
    let mut stmt = conn.prepare_cached(
        "SELECT location_id, station_id, port_id, ts, status FROM port_status
         ORDER BY location_id, station_id, port_id, ts",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            PortKey::new(row.get(0)?, row.get(1)?, row.get(2)?),
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;
    let mut history: PortHistory = HashMap::new();
    for row in rows {
        let (key, ts_text, status) = row?;
        push_sample(history.entry(key).or_default(), &ts_text, status);
    }
    history.retain(|_, timeline| !timeline.is_empty());
    Ok(history)
}

/// The most recent stored record per device.
pub fn latest_records(conn: &Connection) -> AppResult<Vec<PortRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT ps.location_id, ps.station_id, ps.port_id, ps.status, ps.last_updated
         FROM port_status ps
         JOIN (
             SELECT location_id, station_id, port_id, MAX(ts) AS max_ts
             FROM port_status
             GROUP BY location_id, station_id, port_id
         ) latest
           ON ps.location_id IS latest.location_id
          AND ps.station_id IS latest.station_id
          AND ps.port_id IS latest.port_id
          AND ps.ts = latest.max_ts",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PortRecord {
            location_id: row.get(0)?,
            station_id: row.get(1)?,
            port_id: row.get(2)?,
            status: row.get(3)?,
            last_updated: row.get(4)?,
        })
    })?;
    let mut records = Vec::new();
    for record in rows {
        records.push(record?);
    }
    Ok(records)
}

/// Every known station with a non-null station id.
pub fn distinct_stations(conn: &Connection) -> AppResult<Vec<(Option<String>, String)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT location_id, station_id FROM port_status
         WHERE station_id IS NOT NULL",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut stations = Vec::new();
    for station in rows {
        stations.push(station?);
    }
    Ok(stations)
}
