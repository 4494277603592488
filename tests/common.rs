#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use std::env;
use std::fs;
use std::path::PathBuf;

use chargewatch::models::record::PortRecord;
use chargewatch::utils::time::fmt_ts;

pub fn cw() -> Command {
    cargo_bin_cmd!("chargewatch")
}

/// Command with an isolated config directory, so parallel tests never
/// fight over one config file.
pub fn cw_in(name: &str) -> Command {
    let mut home: PathBuf = env::temp_dir();
    home.push(format!("{}_chargewatch_home", name));
    fs::create_dir_all(&home).ok();
    let mut cmd = cw();
    cmd.env("HOME", &home).env("APPDATA", &home);
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_chargewatch.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Fresh in-memory database with the full schema.
pub fn mem_db() -> Connection {
    chargewatch::db::connect(":memory:").expect("open in-memory db")
}

pub fn record(
    location: Option<&str>,
    station: Option<&str>,
    port: Option<&str>,
    status: Option<&str>,
) -> PortRecord {
    PortRecord {
        location_id: location.map(str::to_owned),
        station_id: station.map(str::to_owned),
        port_id: port.map(str::to_owned),
        status: status.map(str::to_owned),
        last_updated: None,
    }
}

/// Insert a status row directly, bypassing snapshot deduplication.
pub fn insert_row(
    conn: &Connection,
    ts: DateTime<Utc>,
    location: Option<&str>,
    station: Option<&str>,
    port: Option<&str>,
    status: Option<&str>,
) {
    conn.execute(
        "INSERT INTO port_status (ts, location_id, station_id, port_id, status, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
        rusqlite::params![fmt_ts(ts), location, station, port, status],
    )
    .expect("insert status row");
}

pub fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM port_status", [], |row| row.get(0))
        .expect("count rows")
}

pub fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(minutes)
}
