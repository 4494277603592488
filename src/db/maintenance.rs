//! Database maintenance: size statistics and compaction.

use std::fs;

use rusqlite::Connection;
use serde::Serialize;

use crate::errors::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub rows: i64,
    pub size_bytes: u64,
    pub page_size: i64,
    pub freelist_pages: i64,
}

pub fn db_stats(conn: &Connection, db_path: &str) -> AppResult<DbStats> {
    let rows: i64 = conn.query_row("SELECT COUNT(*) FROM port_status", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
    let freelist_pages: i64 = conn.query_row("PRAGMA freelist_count", [], |row| row.get(0))?;
    let size_bytes = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    Ok(DbStats {
        rows,
        size_bytes,
        page_size,
        freelist_pages,
    })
}

/// Run VACUUM to reclaim free space.
pub fn compress_db(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("VACUUM")?;
    Ok(())
}
