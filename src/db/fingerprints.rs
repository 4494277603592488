//! Persistence for station fingerprint heatmaps.
//!
//! Fingerprints are stored as JSON payloads keyed by
//! (location, station, start, end); re-saving the same key overwrites the
//! payload.

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::core::fingerprint::StationFingerprint;
use crate::errors::AppResult;
use crate::utils::time::fmt_ts;

pub fn save_station_fingerprint(
    conn: &Connection,
    fingerprint: &StationFingerprint,
) -> AppResult<()> {
    let payload = serde_json::to_string(fingerprint)?;
    conn.execute(
        r#"INSERT INTO station_fingerprint_heatmap
               (location_id, station_id, start, "end", generated, data)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(location_id, station_id, start, "end") DO UPDATE SET
               generated = excluded.generated,
               data = excluded.data"#,
        params![
            fingerprint.location_id,
            fingerprint.station_id,
            fmt_ts(fingerprint.start),
            fmt_ts(fingerprint.end),
            fmt_ts(fingerprint.generated),
            payload,
        ],
    )?;
    Ok(())
}

/// The most recently generated fingerprint for a station, or None when
/// nothing is stored or the stored payload no longer parses.
pub fn latest_station_fingerprint(
    conn: &Connection,
    location_id: Option<&str>,
    station_id: Option<&str>,
) -> AppResult<Option<StationFingerprint>> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT data FROM station_fingerprint_heatmap
             WHERE location_id IS ?1 AND station_id IS ?2
             ORDER BY generated DESC
             LIMIT 1",
            params![location_id, station_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(payload) = payload else {
        return Ok(None);
    };
    match serde_json::from_str(&payload) {
        Ok(fingerprint) => Ok(Some(fingerprint)),
        Err(err) => {
            debug!(%err, "discarding unreadable fingerprint payload");
            Ok(None)
        }
    }
}
