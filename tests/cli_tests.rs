use predicates::str::contains;

mod common;
use common::{cw_in, setup_test_db};

#[test]
fn init_then_db_info() {
    let name = "cli_init_info";
    let db_path = setup_test_db(name);

    cw_in(name).args(["--db", &db_path, "init"]).assert().success();

    cw_in(name).args(["--db", &db_path, "db", "--info"])
        .assert()
        .success()
        .stdout(contains("Status rows"));
}

#[test]
fn db_check_reports_ok() {
    let name = "cli_db_check";
    let db_path = setup_test_db(name);
    cw_in(name).args(["--db", &db_path, "init"]).assert().success();

    cw_in(name).args(["--db", &db_path, "db", "--check"])
        .assert()
        .success()
        .stdout(contains("Integrity check passed"));
}

#[test]
fn stats_prints_json() {
    let name = "cli_stats";
    let db_path = setup_test_db(name);
    cw_in(name).args(["--db", &db_path, "init"]).assert().success();

    cw_in(name).args(["--db", &db_path, "stats"])
        .assert()
        .success()
        .stdout(contains("\"chargers\""));
}

#[test]
fn analyze_prints_empty_report() {
    let name = "cli_analyze";
    let db_path = setup_test_db(name);
    cw_in(name).args(["--db", &db_path, "init"]).assert().success();

    cw_in(name).args(["--db", &db_path, "analyze", "--unused-days", "3"])
        .assert()
        .success()
        .stdout(contains("\"problematic\""));
}

#[test]
fn fingerprint_worker_runs_on_empty_queue() {
    let name = "cli_worker";
    let db_path = setup_test_db(name);
    cw_in(name).args(["--db", &db_path, "init"]).assert().success();

    cw_in(name).args(["--db", &db_path, "schedule-fingerprints"])
        .assert()
        .success();

    cw_in(name).args(["--db", &db_path, "work-fingerprints"])
        .assert()
        .success()
        .stdout(contains("No due fingerprint jobs"));
}
