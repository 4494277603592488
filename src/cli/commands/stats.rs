use chrono::Utc;

use crate::config::Config;
use crate::core::stats::stats_from_db;
use crate::db;
use crate::errors::AppResult;

/// Handle the `stats` command: dump dashboard statistics as JSON.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let conn = db::connect(&cfg.database)?;
    let stats = stats_from_db(&conn, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
