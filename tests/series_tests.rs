use chrono::{Duration, Utc};

use chargewatch::core::series::{charger_sessions, sessions_per_day, sessions_time_series};
use chargewatch::errors::AppError;

mod common;
use common::{insert_row, mem_db};

fn seed_session(conn: &rusqlite::Connection, start_min_ago: i64, length_min: i64) {
    let now = Utc::now();
    insert_row(
        conn,
        now - Duration::minutes(start_min_ago),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("IN_USE"),
    );
    insert_row(
        conn,
        now - Duration::minutes(start_min_ago - length_min),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("AVAILABLE"),
    );
}

#[test]
fn daily_series_is_continuous_and_counts_session_starts() {
    let conn = mem_db();
    seed_session(&conn, 120, 30);

    let series = sessions_time_series(&conn, 3, "day").unwrap();
    assert_eq!(series.len(), 3);
    for pair in series.windows(2) {
        assert_eq!(pair[1].start - pair[0].start, Duration::days(1));
    }
    let total: i64 = series.iter().map(|b| b.sessions).sum();
    assert_eq!(total, 1);
}

#[test]
fn hourly_series_fills_empty_buckets() {
    let conn = mem_db();
    seed_session(&conn, 90, 30);

    let series = sessions_time_series(&conn, 1, "hour").unwrap();
    assert_eq!(series.len(), 25);
    for pair in series.windows(2) {
        assert_eq!(pair[1].start - pair[0].start, Duration::hours(1));
    }
    let total: i64 = series.iter().map(|b| b.sessions).sum();
    assert_eq!(total, 1);
    assert!(series.iter().filter(|b| b.sessions == 0).count() >= 23);
}

#[test]
fn granularity_is_case_insensitive_but_strict() {
    let conn = mem_db();
    assert!(sessions_time_series(&conn, 1, "Day").is_ok());
    assert!(sessions_time_series(&conn, 1, "HOUR").is_ok());

    let err = sessions_time_series(&conn, 1, "fortnight").unwrap_err();
    assert!(matches!(err, AppError::InvalidGranularity(g) if g == "fortnight"));
}

#[test]
fn sessions_per_day_wraps_the_daily_series() {
    let conn = mem_db();
    seed_session(&conn, 60, 20);

    let days = sessions_per_day(&conn, 2).unwrap();
    assert_eq!(days.len(), 2);
    let total: i64 = days.iter().map(|d| d.sessions).sum();
    assert_eq!(total, 1);
}

#[test]
fn charger_sessions_lists_recent_sessions_newest_first() {
    let conn = mem_db();
    seed_session(&conn, 300, 60);
    seed_session(&conn, 120, 30);

    let sessions = charger_sessions(&conn, Some("L"), Some("S"), 10).unwrap();
    let port = sessions
        .get(&Some("P".to_string()))
        .expect("port timeline");
    assert_eq!(port.len(), 2);
    assert!(port[0].start > port[1].start);
    assert!((port[0].duration - 30.0).abs() < 1e-6);
    assert!((port[1].duration - 60.0).abs() < 1e-6);
}

#[test]
fn charger_sessions_respects_the_limit() {
    let conn = mem_db();
    for i in 0..4 {
        seed_session(&conn, 1000 - i * 200, 30);
    }
    let sessions = charger_sessions(&conn, Some("L"), Some("S"), 2).unwrap();
    let port = sessions.get(&Some("P".to_string())).expect("port timeline");
    assert_eq!(port.len(), 2);
}
