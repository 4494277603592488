//! SQLite persistence layer.
//!
//! The database is the sole synchronization point between concurrent
//! writers, analytics readers, and job workers: all cross-process
//! coordination happens through conditional SQL writes, never in-process
//! locks.

pub mod fingerprints;
pub mod history;
pub mod jobs;
pub mod maintenance;
pub mod migrate;
pub mod retention;
pub mod snapshot;

use rusqlite::Connection;

use crate::errors::AppResult;

/// Open (or create) the database, run pending migrations and an initial
/// retention pass. Accepts `":memory:"` for tests.
pub fn connect(path: &str) -> AppResult<Connection> {
    let conn = Connection::open(path)?;
    migrate::run_pending_migrations(&conn)?;
    retention::prune_old_data(&conn)?;
    Ok(conn)
}
