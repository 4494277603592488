//! Snapshot ingestion.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::db::retention;
use crate::errors::AppResult;
use crate::models::record::PortRecord;
use crate::utils::time::fmt_ts;

/// Store one fleet snapshot, keeping only state changes.
///
/// For each record the most recent stored status of the same device is
/// looked up (null-safe key match); a new row is written only when the
/// status differs. Unknown devices are accepted implicitly. Retention
/// pruning runs after every call. Returns whether any row was written.
pub fn save_snapshot(
    conn: &Connection,
    records: &[PortRecord],
    ts: DateTime<Utc>,
) -> AppResult<bool> {
    let ts_text = fmt_ts(ts);
    let mut new_rows: Vec<&PortRecord> = Vec::new();
    for record in records {
        let last: Option<Option<String>> = conn
            .query_row(
                "SELECT status FROM port_status
                 WHERE location_id IS ?1 AND station_id IS ?2 AND port_id IS ?3
                 ORDER BY ts DESC LIMIT 1",
                params![record.location_id, record.station_id, record.port_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(previous) = last
            && previous == record.status
        {
            continue;
        }
        new_rows.push(record);
    }

    if !new_rows.is_empty() {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO port_status (ts, location_id, station_id, port_id, status, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for record in &new_rows {
            stmt.execute(params![
                ts_text,
                record.location_id,
                record.station_id,
                record.port_id,
                record.status,
                record.last_updated,
            ])?;
        }
        debug!(rows = new_rows.len(), "stored snapshot changes");
    }

    retention::prune_old_data(conn)?;
    Ok(!new_rows.is_empty())
}
