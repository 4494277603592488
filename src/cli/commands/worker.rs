use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::fingerprint::station_fingerprint;
use crate::db::{self, fingerprints, jobs};
use crate::db::jobs::JobOutcome;
use crate::errors::AppResult;
use crate::ui::messages;

/// Handle `work-fingerprints`: drain the job queue.
///
/// Each claimed job is processed to a terminal state before the next claim;
/// a station without history completes as failed with a recorded reason
/// instead of staying pending forever.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let conn = db::connect(&cfg.database)?;

    let mut completed = 0usize;
    let mut failed = 0usize;

    loop {
        let now = Utc::now();
        let Some(job) = jobs::dequeue_station_fingerprint_job(&conn, now)? else {
            break;
        };
        let reference = job.scheduled_for.unwrap_or(now);
        match station_fingerprint(
            &conn,
            job.location_id.as_deref(),
            job.station_id.as_deref(),
            reference,
        ) {
            Ok(Some(fingerprint)) => {
                fingerprints::save_station_fingerprint(&conn, &fingerprint)?;
                jobs::complete_station_fingerprint_job(&conn, job.id, JobOutcome::Completed, None)?;
                info!(
                    job = job.id,
                    station = job.station_id.as_deref().unwrap_or("-"),
                    "fingerprint saved"
                );
                completed += 1;
            }
            Ok(None) => {
                jobs::complete_station_fingerprint_job(
                    &conn,
                    job.id,
                    JobOutcome::Failed,
                    Some("no history"),
                )?;
                warn!(job = job.id, "no history for station, job failed");
                failed += 1;
            }
            Err(err) => {
                jobs::complete_station_fingerprint_job(
                    &conn,
                    job.id,
                    JobOutcome::Failed,
                    Some(&err.to_string()),
                )?;
                warn!(job = job.id, %err, "fingerprint job failed");
                failed += 1;
            }
        }
    }

    if completed == 0 && failed == 0 {
        messages::info("No due fingerprint jobs.");
    } else {
        messages::success(format!(
            "Processed {} job(s), {} failed.",
            completed + failed,
            failed
        ));
    }
    Ok(())
}
