use chrono::Utc;

use crate::config::Config;
use crate::db::{self, jobs};
use crate::errors::AppResult;
use crate::ui::messages;

/// Handle `schedule-fingerprints`: queue one job per known station.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let conn = db::connect(&cfg.database)?;
    let touched = jobs::schedule_station_fingerprints(&conn, Utc::now())?;
    if touched == 0 {
        messages::warning("No stations with history, nothing scheduled.");
    } else {
        messages::success(format!("Scheduled {} fingerprint job(s).", touched));
    }
    Ok(())
}
