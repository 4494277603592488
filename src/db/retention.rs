//! Tiered data retention.
//!
//! Three detail tiers computed from "now": full detail for the most recent
//! HIGH_DETAIL_DAYS, at most one sample per clock-hour per device up to
//! MEDIUM_DETAIL_DAYS, at most one sample per clock-day beyond that.
//! Pruning is idempotent and runs after every snapshot write; its cost is
//! bounded by the rows inside the scanned windows.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::errors::AppResult;
use crate::models::port_key::PortKey;
use crate::utils::time::{fmt_ts, parse_ts, truncate_to_day, truncate_to_hour};

pub const HIGH_DETAIL_DAYS: i64 = 7;
pub const MEDIUM_DETAIL_DAYS: i64 = 30;

const DELETE_CHUNK: usize = 1000;

/// Row ids of the newest sample per device. These are never pruned, even
/// when they fall into a coarser tier, so latest-status queries stay
/// correct after compaction.
fn latest_row_ids(conn: &Connection) -> AppResult<HashSet<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT ps.id
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
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
    let mut ids = HashSet::new();
    for id in rows {
        ids.insert(id?);
    }
    Ok(ids)
}

/// Scan one tier window and collect the ids of rows that collapse into an
/// already-seen `(device, bucket)` pair.
fn downsample_range(
    conn: &Connection,
    bucket: fn(DateTime<Utc>) -> DateTime<Utc>,
    newer_than: Option<DateTime<Utc>>,
    older_than: Option<DateTime<Utc>>,
    keep: &HashSet<i64>,
) -> AppResult<Vec<i64>> {
    let mut sql = String::from(
        "SELECT id, location_id, station_id, port_id, ts FROM port_status WHERE 1 = 1",
    );
    let mut params: Vec<String> = Vec::new();
    if let Some(newer) = newer_than {
        sql.push_str(" AND ts >= ?");
        params.push(fmt_ts(newer));
    }
    if let Some(older) = older_than {
        sql.push_str(" AND ts < ?");
        params.push(fmt_ts(older));
    }
    sql.push_str(" ORDER BY location_id, station_id, port_id, ts");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            PortKey::new(row.get(1)?, row.get(2)?, row.get(3)?),
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut seen: HashMap<(PortKey, DateTime<Utc>), i64> = HashMap::new();
    let mut to_delete = Vec::new();
    for row in rows {
        let (id, key, ts_text) = row?;
        let Some(ts) = parse_ts(&ts_text) else {
            debug!(row = id, ts = %ts_text, "unparseable timestamp, skipping row");
            continue;
        };
        if keep.contains(&id) {
            continue;
        }
        let slot = (key, bucket(ts));
        if seen.contains_key(&slot) {
            to_delete.push(id);
        } else {
            seen.insert(slot, id);
        }
    }
    Ok(to_delete)
}

fn delete_rows(conn: &Connection, row_ids: &[i64]) -> AppResult<()> {
    for chunk in row_ids.chunks(DELETE_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!("DELETE FROM port_status WHERE id IN ({placeholders})");
        conn.execute(&sql, rusqlite::params_from_iter(chunk.iter()))?;
    }
    Ok(())
}

/// Downsample old rows according to the retention tiers, relative to the
/// wall clock.
pub fn prune_old_data(conn: &Connection) -> AppResult<()> {
    prune_old_data_as_of(conn, Utc::now())
}

/// Same as [`prune_old_data`] with an explicit reference time.
pub fn prune_old_data_as_of(conn: &Connection, now: DateTime<Utc>) -> AppResult<()> {
    let high_detail_cutoff = now - Duration::days(HIGH_DETAIL_DAYS);
    let medium_detail_cutoff = now - Duration::days(MEDIUM_DETAIL_DAYS);

    let keep = latest_row_ids(conn)?;

    let mut to_delete = Vec::new();
    // One record per day for very old data.
    to_delete.extend(downsample_range(
        conn,
        truncate_to_day,
        None,
        Some(medium_detail_cutoff),
        &keep,
    )?);
    // One record per hour for medium-aged data.
    to_delete.extend(downsample_range(
        conn,
        truncate_to_hour,
        Some(medium_detail_cutoff),
        Some(high_detail_cutoff),
        &keep,
    )?);

    if !to_delete.is_empty() {
        delete_rows(conn, &to_delete)?;
        debug!(rows = to_delete.len(), "pruned historical rows");
    }
    Ok(())
}
