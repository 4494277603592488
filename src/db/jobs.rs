//! Fingerprint regeneration job queue.
//!
//! Durable, claimable work queue keyed by (location, station, scheduled_for).
//! Claiming is a single conditional UPDATE re-checking `status = 'pending'`;
//! when it affects zero rows another worker won the race and the caller gets
//! `Ok(None)`, not an error. Known limitation: a crashed worker leaves its
//! job in `processing` forever — there is no lease timeout or sweeper.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::db::history::distinct_stations;
use crate::errors::AppResult;
use crate::utils::time::{fmt_ts, parse_ts};

/// Terminal outcome of a processed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::Failed => "failed",
        }
    }
}

/// A job claimed by this worker.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: i64,
    pub location_id: Option<String>,
    pub station_id: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub attempts: i64,
}

/// Queue one pending fingerprint job per known station.
///
/// Rescheduling is idempotent: an existing job for the same
/// (location, station, scheduled_for) is reset to pending and its error
/// cleared rather than duplicated. Returns the number of rows touched.
pub fn schedule_station_fingerprints(
    conn: &Connection,
    scheduled_for: DateTime<Utc>,
) -> AppResult<usize> {
    let stations = distinct_stations(conn)?;
    if stations.is_empty() {
        return Ok(0);
    }
    let scheduled_text = fmt_ts(scheduled_for);
    let now_text = fmt_ts(Utc::now());
    let mut stmt = conn.prepare_cached(
        "INSERT INTO station_fingerprint_jobs
             (location_id, station_id, scheduled_for, status, attempts, last_error, created, updated)
         VALUES (?1, ?2, ?3, 'pending', 0, NULL, ?4, ?4)
         ON CONFLICT(location_id, station_id, scheduled_for) DO UPDATE SET
             status = 'pending',
             updated = excluded.updated,
             last_error = NULL",
    )?;
    let mut touched = 0;
    for (location_id, station_id) in &stations {
        touched += stmt.execute(params![location_id, station_id, scheduled_text, now_text])?;
    }
    debug!(jobs = touched, "scheduled station fingerprints");
    Ok(touched)
}

/// Claim the next due pending job, if any.
pub fn dequeue_station_fingerprint_job(
    conn: &Connection,
    now: DateTime<Utc>,
) -> AppResult<Option<ClaimedJob>> {
    let now_text = fmt_ts(now);
    let candidate: Option<(i64, Option<String>, Option<String>, String, i64)> = conn
        .query_row(
            "SELECT id, location_id, station_id, scheduled_for, attempts
             FROM station_fingerprint_jobs
             WHERE status = 'pending' AND scheduled_for <= ?1
             ORDER BY scheduled_for ASC, id ASC
             LIMIT 1",
            [&now_text],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .optional()?;
    let Some((id, location_id, station_id, scheduled_text, attempts)) = candidate else {
        return Ok(None);
    };

    // The precondition is re-checked inside the write: if another worker
    // claimed the job between the SELECT and here, zero rows change and the
    // claim is simply lost.
    let claimed = conn.execute(
        "UPDATE station_fingerprint_jobs
         SET status = 'processing', attempts = attempts + 1, updated = ?1
         WHERE id = ?2 AND status = 'pending'",
        params![now_text, id],
    )?;
    if claimed == 0 {
        return Ok(None);
    }

    Ok(Some(ClaimedJob {
        id,
        location_id,
        station_id,
        scheduled_for: parse_ts(&scheduled_text),
        attempts: attempts + 1,
    }))
}

/// Terminal transition: mark a claimed job completed or failed.
pub fn complete_station_fingerprint_job(
    conn: &Connection,
    job_id: i64,
    outcome: JobOutcome,
    error: Option<&str>,
) -> AppResult<()> {
    let now_text = fmt_ts(Utc::now());
    let completed_text = match outcome {
        JobOutcome::Completed => Some(now_text.clone()),
        JobOutcome::Failed => None,
    };
    conn.execute(
        "UPDATE station_fingerprint_jobs
         SET status = ?1, last_error = ?2, updated = ?3, completed = ?4
         WHERE id = ?5",
        params![outcome.as_str(), error, now_text, completed_text, job_id],
    )?;
    Ok(())
}
