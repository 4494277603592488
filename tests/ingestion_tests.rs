use chrono::{Duration, Utc};

use chargewatch::db::snapshot::save_snapshot;

mod common;
use common::{mem_db, record, row_count};

#[test]
fn unchanged_status_is_not_stored_again() {
    let conn = mem_db();
    let now = Utc::now();
    let fleet = vec![record(Some("L1"), Some("S1"), Some("P1"), Some("AVAILABLE"))];

    let wrote = save_snapshot(&conn, &fleet, now - Duration::minutes(30)).unwrap();
    assert!(wrote);
    assert_eq!(row_count(&conn), 1);

    // Same status again: deduplicated, nothing written.
    let wrote = save_snapshot(&conn, &fleet, now - Duration::minutes(20)).unwrap();
    assert!(!wrote);
    assert_eq!(row_count(&conn), 1);

    // A change is stored.
    let fleet = vec![record(Some("L1"), Some("S1"), Some("P1"), Some("IN_USE"))];
    let wrote = save_snapshot(&conn, &fleet, now - Duration::minutes(10)).unwrap();
    assert!(wrote);
    assert_eq!(row_count(&conn), 2);
}

#[test]
fn devices_with_null_identifiers_deduplicate_too() {
    let conn = mem_db();
    let now = Utc::now();
    let fleet = vec![record(None, None, None, Some("AVAILABLE"))];

    save_snapshot(&conn, &fleet, now - Duration::minutes(10)).unwrap();
    let wrote = save_snapshot(&conn, &fleet, now - Duration::minutes(5)).unwrap();
    assert!(!wrote);
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn distinct_devices_do_not_shadow_each_other() {
    let conn = mem_db();
    let now = Utc::now();
    let fleet = vec![
        record(Some("L1"), Some("S1"), Some("P1"), Some("AVAILABLE")),
        record(Some("L1"), Some("S1"), Some("P2"), Some("AVAILABLE")),
        record(Some("L1"), Some("S1"), None, Some("AVAILABLE")),
    ];
    save_snapshot(&conn, &fleet, now - Duration::minutes(10)).unwrap();
    assert_eq!(row_count(&conn), 3);
}

#[test]
fn status_to_null_counts_as_change() {
    let conn = mem_db();
    let now = Utc::now();
    save_snapshot(
        &conn,
        &[record(Some("L1"), Some("S1"), Some("P1"), Some("AVAILABLE"))],
        now - Duration::minutes(10),
    )
    .unwrap();
    let wrote = save_snapshot(
        &conn,
        &[record(Some("L1"), Some("S1"), Some("P1"), None)],
        now - Duration::minutes(5),
    )
    .unwrap();
    assert!(wrote);
    assert_eq!(row_count(&conn), 2);
}
