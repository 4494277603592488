use chrono::{Duration, TimeZone, Utc};

use chargewatch::core::intervals::{
    StatusSample, session_durations, session_records, status_intervals,
};

fn sample(base_min: i64, status: Option<&str>) -> StatusSample {
    let ts = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap() + Duration::minutes(base_min);
    StatusSample::new(ts, status.map(str::to_owned))
}

#[test]
fn intervals_tile_the_window_without_gaps() {
    let samples = vec![
        sample(0, Some("AVAILABLE")),
        sample(10, Some("IN_USE")),
        sample(25, Some("AVAILABLE")),
    ];
    let end = sample(60, None).ts;
    let intervals = status_intervals(&samples, end);

    assert_eq!(intervals.len(), 3);
    assert_eq!(intervals[0].start, samples[0].ts);
    for pair in intervals.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert_eq!(intervals[2].end, end);
    assert_eq!(intervals[1].status.as_deref(), Some("IN_USE"));
}

#[test]
fn last_sample_holds_until_query_end() {
    let samples = vec![sample(0, Some("IN_USE"))];
    let end = sample(45, None).ts;
    let intervals = status_intervals(&samples, end);
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].start, samples[0].ts);
    assert_eq!(intervals[0].end, end);
}

#[test]
fn later_sample_wins_on_equal_timestamps() {
    let samples = vec![
        sample(0, Some("AVAILABLE")),
        sample(0, Some("OUT_OF_ORDER")),
        sample(30, Some("AVAILABLE")),
    ];
    let end = sample(60, None).ts;
    let intervals = status_intervals(&samples, end);
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0].status.as_deref(), Some("OUT_OF_ORDER"));
}

#[test]
fn samples_past_the_end_are_clipped() {
    let samples = vec![sample(0, Some("AVAILABLE")), sample(90, Some("IN_USE"))];
    let end = sample(60, None).ts;
    let intervals = status_intervals(&samples, end);
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].end, end);
    assert_eq!(intervals[0].status.as_deref(), Some("AVAILABLE"));
}

#[test]
fn empty_timeline_yields_no_intervals() {
    let end = sample(0, None).ts;
    assert!(status_intervals(&[], end).is_empty());
}

#[test]
fn closed_session_duration_is_exact() {
    // IN_USE at t0, AVAILABLE at t0+10min: exactly one 10-minute session.
    let samples = vec![sample(0, Some("IN_USE")), sample(10, Some("AVAILABLE"))];
    let records = session_records(&samples);
    assert_eq!(records.len(), 1);
    assert!((records[0].duration_min - 10.0).abs() < 1e-9);
    assert_eq!(records[0].start, samples[0].ts);
    assert_eq!(records[0].end, samples[1].ts);
}

#[test]
fn open_session_is_clipped_at_now() {
    let samples = vec![sample(0, Some("AVAILABLE")), sample(5, Some("IN_USE"))];
    let now = sample(35, None).ts;
    let durations = session_durations(&samples, now);
    assert_eq!(durations.len(), 1);
    assert!((durations[0] - 30.0).abs() < 1e-9);

    // Open sessions never appear in the closed-session view.
    assert!(session_records(&samples).is_empty());
}

#[test]
fn consecutive_active_samples_form_one_session() {
    let samples = vec![
        sample(0, Some("IN_USE")),
        sample(5, Some("IN_USE")),
        sample(20, Some("AVAILABLE")),
        sample(30, Some("IN_USE")),
        sample(40, Some("AVAILABLE")),
    ];
    let now = sample(60, None).ts;
    let durations = session_durations(&samples, now);
    assert_eq!(durations.len(), 2);
    assert!((durations[0] - 20.0).abs() < 1e-9);
    assert!((durations[1] - 10.0).abs() < 1e-9);
}
