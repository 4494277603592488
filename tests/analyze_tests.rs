use chrono::{Duration, Utc};

use chargewatch::core::analyze::{analyze_chargers, count_unused_stations};
use chargewatch::models::rules::Rules;

mod common;
use common::{insert_row, mem_db};

#[test]
fn young_station_is_not_flagged() {
    let conn = mem_db();
    let now = Utc::now();
    // Six hours of history; every rule needs more before it may fire.
    insert_row(
        &conn,
        now - Duration::hours(6),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("AVAILABLE"),
    );

    let rules = Rules {
        unused_days: 7,
        long_session_days: 7,
        long_session_min: 5.0,
        unavailable_hours: 24,
    };
    let (problematic, counts) = analyze_chargers(&conn, &rules, now, None).unwrap();
    assert!(problematic.is_empty());
    assert_eq!(counts.unused, 0);
    assert_eq!(counts.no_long, 0);
    assert_eq!(counts.unavailable, 0);
}

#[test]
fn station_without_usage_is_flagged_unused() {
    let conn = mem_db();
    let now = Utc::now();
    // Four days of nothing but AVAILABLE. Fetch window is five days (the
    // largest rule window), so the whole history is visible.
    insert_row(
        &conn,
        now - Duration::days(4),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("AVAILABLE"),
    );

    let rules = Rules {
        unused_days: 2,
        long_session_days: 5,
        long_session_min: 5.0,
        unavailable_hours: 24,
    };
    let (problematic, counts) = analyze_chargers(&conn, &rules, now, None).unwrap();
    assert_eq!(problematic.len(), 1);
    assert_eq!(problematic[0].station_id.as_deref(), Some("S"));
    assert!(problematic[0].reason.contains("unused > 2d"));
    assert_eq!(counts.unused, 1);
    // Not enough history for the long-session rule yet.
    assert_eq!(counts.no_long, 0);
    assert_eq!(counts.unavailable, 0);
}

#[test]
fn rules_combine_per_station() {
    let conn = mem_db();
    let now = Utc::now();
    let rules = Rules {
        unused_days: 1,
        long_session_days: 1,
        long_session_min: 5.0,
        unavailable_hours: 6,
    };
    let day_ago = now - Duration::days(1);

    // Station A: healthy. A 30-minute session half a day ago.
    insert_row(&conn, day_ago, Some("L"), Some("A"), Some("P"), Some("AVAILABLE"));
    insert_row(
        &conn,
        now - Duration::hours(12),
        Some("L"),
        Some("A"),
        Some("P"),
        Some("IN_USE"),
    );
    insert_row(
        &conn,
        now - Duration::hours(12) + Duration::minutes(30),
        Some("L"),
        Some("A"),
        Some("P"),
        Some("AVAILABLE"),
    );

    // Station B: idle the whole window.
    insert_row(&conn, day_ago, Some("L"), Some("B"), Some("P"), Some("AVAILABLE"));

    // Station C: one short session at the window opening, then broken.
    insert_row(&conn, day_ago, Some("L"), Some("C"), Some("P"), Some("IN_USE"));
    insert_row(
        &conn,
        day_ago + Duration::minutes(2),
        Some("L"),
        Some("C"),
        Some("P"),
        Some("AVAILABLE"),
    );
    insert_row(
        &conn,
        now - Duration::hours(23),
        Some("L"),
        Some("C"),
        Some("P"),
        Some("OUT_OF_ORDER"),
    );

    let (problematic, counts) = analyze_chargers(&conn, &rules, now, None).unwrap();

    assert_eq!(counts.unused, 1); // B
    assert_eq!(counts.no_long, 2); // B and C
    assert_eq!(counts.unavailable, 1); // C
    assert_eq!(problematic.len(), 2);

    let mut stations: Vec<Option<&str>> = problematic
        .iter()
        .map(|p| p.station_id.as_deref())
        .collect();
    stations.sort();
    assert_eq!(stations, vec![Some("B"), Some("C")]);
}

#[test]
fn idle_station_with_stale_history_is_still_flagged() {
    let conn = mem_db();
    let now = Utc::now();
    // Change-only storage: eight idle days leave a single row, older than
    // every rule window. The carried-in sample keeps the station visible.
    insert_row(
        &conn,
        now - Duration::days(8),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("AVAILABLE"),
    );

    let rules = Rules {
        unused_days: 7,
        long_session_days: 7,
        long_session_min: 5.0,
        unavailable_hours: 24,
    };
    let (problematic, counts) = analyze_chargers(&conn, &rules, now, None).unwrap();
    assert_eq!(problematic.len(), 1);
    assert!(problematic[0].reason.contains("unused > 7d"));
    assert_eq!(counts.unused, 1);
    assert_eq!(counts.no_long, 1);
    assert_eq!(counts.unavailable, 0);
}

#[test]
fn unavailable_rule_needs_every_port_down() {
    let conn = mem_db();
    let now = Utc::now();
    let rules = Rules {
        unused_days: 30,
        long_session_days: 30,
        long_session_min: 5.0,
        unavailable_hours: 6,
    };
    let day_ago = now - Duration::days(1);

    insert_row(&conn, day_ago, Some("L"), Some("S"), Some("P1"), Some("OUT_OF_ORDER"));
    insert_row(&conn, day_ago, Some("L"), Some("S"), Some("P2"), Some("AVAILABLE"));

    let (problematic, counts) = analyze_chargers(&conn, &rules, now, None).unwrap();
    assert_eq!(counts.unavailable, 0);
    assert!(problematic.is_empty());
}

#[test]
fn unused_station_count_respects_minimum_history() {
    let conn = mem_db();
    let now = Utc::now();

    // Station with 3 days of idle history.
    insert_row(
        &conn,
        now - Duration::days(3),
        Some("L"),
        Some("OLD"),
        Some("P"),
        Some("AVAILABLE"),
    );
    // Station seen for the first time an hour ago.
    insert_row(
        &conn,
        now - Duration::hours(1),
        Some("L"),
        Some("NEW"),
        Some("P"),
        Some("AVAILABLE"),
    );

    assert_eq!(count_unused_stations(&conn, 2, now, None).unwrap(), 1);
    assert_eq!(count_unused_stations(&conn, 7, now, None).unwrap(), 0);
}
