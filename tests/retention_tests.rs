use chrono::{Duration, Utc};

use chargewatch::db::retention::prune_old_data_as_of;
use chargewatch::utils::time::{truncate_to_day, truncate_to_hour};

mod common;
use common::{insert_row, mem_db, row_count};

#[test]
fn old_rows_collapse_to_one_per_day() {
    let conn = mem_db();
    let now = Utc::now();
    let old_day = truncate_to_day(now - Duration::days(40)) + Duration::hours(1);

    // Three rows on the same old day, then a recent row as the latest state.
    insert_row(&conn, old_day, Some("L"), Some("S"), Some("P"), Some("AVAILABLE"));
    insert_row(
        &conn,
        old_day + Duration::hours(2),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("IN_USE"),
    );
    insert_row(
        &conn,
        old_day + Duration::hours(5),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("AVAILABLE"),
    );
    insert_row(
        &conn,
        now - Duration::hours(1),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("IN_USE"),
    );

    prune_old_data_as_of(&conn, now).unwrap();

    // First row of the old day survives, the recent row survives.
    assert_eq!(row_count(&conn), 2);
}

#[test]
fn medium_aged_rows_collapse_to_one_per_hour() {
    let conn = mem_db();
    let now = Utc::now();
    let base = truncate_to_hour(now - Duration::days(10));

    insert_row(&conn, base, Some("L"), Some("S"), Some("P"), Some("AVAILABLE"));
    insert_row(
        &conn,
        base + Duration::minutes(20),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("IN_USE"),
    );
    insert_row(
        &conn,
        base + Duration::hours(2),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("AVAILABLE"),
    );
    insert_row(
        &conn,
        now - Duration::hours(1),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("IN_USE"),
    );

    prune_old_data_as_of(&conn, now).unwrap();

    // base survives, base+20min collapses into the same hour, the rest stays.
    assert_eq!(row_count(&conn), 3);
}

#[test]
fn recent_rows_are_never_pruned() {
    let conn = mem_db();
    let now = Utc::now();
    for minutes in [0, 1, 2, 3, 4] {
        insert_row(
            &conn,
            now - Duration::minutes(60 - minutes),
            Some("L"),
            Some("S"),
            Some("P"),
            Some(if minutes % 2 == 0 { "AVAILABLE" } else { "IN_USE" }),
        );
    }
    prune_old_data_as_of(&conn, now).unwrap();
    assert_eq!(row_count(&conn), 5);
}

#[test]
fn newest_row_per_device_survives_even_when_old() {
    let conn = mem_db();
    let now = Utc::now();
    let old_day = truncate_to_day(now - Duration::days(60)) + Duration::hours(1);

    insert_row(&conn, old_day, Some("L"), Some("S"), Some("P"), Some("AVAILABLE"));
    insert_row(
        &conn,
        old_day + Duration::hours(1),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("IN_USE"),
    );
    insert_row(
        &conn,
        old_day + Duration::hours(2),
        Some("L"),
        Some("S"),
        Some("P"),
        Some("OUT_OF_ORDER"),
    );

    prune_old_data_as_of(&conn, now).unwrap();

    // First-of-day plus the newest row; only the middle row is dropped.
    assert_eq!(row_count(&conn), 2);
    let last_status: Option<String> = conn
        .query_row(
            "SELECT status FROM port_status ORDER BY ts DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(last_status.as_deref(), Some("OUT_OF_ORDER"));
}

#[test]
fn pruning_is_idempotent() {
    let conn = mem_db();
    let now = Utc::now();
    let old_day = truncate_to_day(now - Duration::days(45));
    for hour in 0..6 {
        insert_row(
            &conn,
            old_day + Duration::hours(hour),
            Some("L"),
            Some("S"),
            Some("P"),
            Some(if hour % 2 == 0 { "AVAILABLE" } else { "IN_USE" }),
        );
    }

    prune_old_data_as_of(&conn, now).unwrap();
    let after_first = row_count(&conn);
    prune_old_data_as_of(&conn, now).unwrap();
    assert_eq!(row_count(&conn), after_first);
}
