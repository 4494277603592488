//! Schema creation and versioning.
//!
//! All schema is guaranteed by migrations; nothing else in the crate issues
//! CREATE TABLE. The `schema_version` singleton row gates future upgrades.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::errors::AppResult;

pub const CURRENT_SCHEMA_VERSION: i32 = 2;

const SCHEMA_STATEMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id      INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS port_status (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    ts           TEXT NOT NULL,
    location_id  TEXT,
    station_id   TEXT,
    port_id      TEXT,
    status       TEXT,
    last_updated TEXT
);

CREATE INDEX IF NOT EXISTS idx_port_ts ON port_status(location_id, station_id, port_id, ts);
CREATE INDEX IF NOT EXISTS idx_ts ON port_status(ts);

CREATE TABLE IF NOT EXISTS station_fingerprint_heatmap (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    location_id TEXT,
    station_id  TEXT,
    start       TEXT NOT NULL,
    "end"       TEXT NOT NULL,
    generated   TEXT NOT NULL,
    data        TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS uniq_station_range
    ON station_fingerprint_heatmap(location_id, station_id, start, "end");
CREATE INDEX IF NOT EXISTS idx_station_generated
    ON station_fingerprint_heatmap(location_id, station_id, generated);

CREATE TABLE IF NOT EXISTS station_fingerprint_jobs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    location_id   TEXT,
    station_id    TEXT,
    scheduled_for TEXT NOT NULL,
    status        TEXT NOT NULL CHECK(status IN ('pending','processing','completed','failed')),
    attempts      INTEGER NOT NULL DEFAULT 0,
    last_error    TEXT,
    created       TEXT NOT NULL,
    updated       TEXT NOT NULL,
    completed     TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS uniq_station_schedule
    ON station_fingerprint_jobs(location_id, station_id, scheduled_for);
CREATE INDEX IF NOT EXISTS idx_jobs_status_schedule
    ON station_fingerprint_jobs(status, scheduled_for);
"#;

fn stored_version(conn: &Connection) -> AppResult<Option<i32>> {
    let version = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version)
}

/// Public entry point: create missing tables and stamp the schema version.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(SCHEMA_STATEMENTS)?;

    match stored_version(conn)? {
        None => {
            conn.execute(
                "INSERT INTO schema_version (id, version) VALUES (1, ?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
            debug!(version = CURRENT_SCHEMA_VERSION, "initialized schema");
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            conn.execute(
                "UPDATE schema_version SET version = ?1 WHERE id = 1",
                [CURRENT_SCHEMA_VERSION],
            )?;
            debug!(from = v, to = CURRENT_SCHEMA_VERSION, "migrated schema");
        }
        Some(_) => {}
    }
    Ok(())
}
