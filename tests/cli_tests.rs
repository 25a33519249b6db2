use chrono::{Duration, TimeZone};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

mod common;
use common::{local, rtrk, setup_test_db, temp_file};

fn init(db: &str, remote: &str) {
    rtrk()
        .args(["--db", db, "--remote-db", remote, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("initialization completed"));
}

/// Three fixes: a first fix, a move of ~550 m after two minutes, and a
/// rate-limited fix thirty seconds later.
fn write_replay(name: &str) -> String {
    let path = temp_file(name, "csv");
    let t0 = local(2026, 3, 2, 9, 0, 0);
    let rows = [
        (45.0700, t0),
        (45.0750, t0 + Duration::minutes(2)),
        (45.0760, t0 + Duration::minutes(2) + Duration::seconds(30)),
    ];

    let mut csv = String::from("user_id,latitude,longitude,timestamp\n");
    for (lat, ts) in rows {
        csv.push_str(&format!("7,{lat},7.6869,{}\n", ts.to_rfc3339()));
    }
    fs::write(&path, csv).expect("write replay");
    path
}

#[test]
fn test_init_then_empty_pending_and_sync() {
    let db = setup_test_db("cli_init");
    let remote = setup_test_db("cli_init_remote");
    init(&db, &remote);

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "pending"])
        .assert()
        .success()
        .stdout(contains("No pending events."));

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "sync"])
        .assert()
        .success()
        .stdout(contains("nothing to sync"));
}

#[test]
fn test_offline_replay_queues_then_sync_delivers() {
    let db = setup_test_db("cli_replay");
    let remote = setup_test_db("cli_replay_remote");
    init(&db, &remote);
    let replay = write_replay("cli_replay");

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "track", "--replay", &replay, "--offline"])
        .assert()
        .success()
        .stdout(contains("Replayed 3 fix(es): 0 delivered, 2 queued"));

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "pending", "--json"])
        .assert()
        .success()
        .stdout(contains("\"Stationary\"").and(contains("\"Moving\"")));

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "sync"])
        .assert()
        .success()
        .stdout(contains("Synced 2 event(s), 0 remaining"));

    let conn = rusqlite::Connection::open(&remote).expect("open remote");
    let codes: Vec<i64> = conn
        .prepare("SELECT code FROM track_points ORDER BY id")
        .expect("prepare")
        .query_map([], |r| r.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows");
    assert_eq!(codes, vec![1, 2]);

    rtrk()
        .args(["--db", &db, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("reconcile").and(contains("delivered 2 of 2")));
}

#[test]
fn test_replay_online_delivers_directly() {
    let db = setup_test_db("cli_replay_online");
    let remote = setup_test_db("cli_replay_online_remote");
    init(&db, &remote);
    let replay = write_replay("cli_replay_online");

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "track", "--replay", &replay])
        .assert()
        .success()
        .stdout(contains("2 delivered, 0 queued"));

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "pending"])
        .assert()
        .success()
        .stdout(contains("No pending events."));
}

#[test]
fn test_replay_outside_active_hours_is_gated() {
    let db = setup_test_db("cli_replay_night");
    let remote = setup_test_db("cli_replay_night_remote");
    init(&db, &remote);

    let path = temp_file("cli_replay_night", "csv");
    let ts = chrono::Local
        .with_ymd_and_hms(2026, 3, 2, 21, 30, 0)
        .earliest()
        .expect("valid time");
    fs::write(
        &path,
        format!("user_id,latitude,longitude,timestamp\n3,45.0,7.0,{}\n", ts.to_rfc3339()),
    )
    .expect("write replay");

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "track", "--replay", &path])
        .assert()
        .success()
        .stdout(contains("1 outside active hours"));
}

#[test]
fn test_pending_remove_unknown_id() {
    let db = setup_test_db("cli_remove");
    let remote = setup_test_db("cli_remove_remote");
    init(&db, &remote);

    rtrk()
        .args(["--db", &db, "pending", "--remove", "42"])
        .assert()
        .success()
        .stdout(contains("No outbox record with id 42"));
}

#[test]
fn test_track_ignores_invalid_signals_and_stops_on_eof() {
    let db = setup_test_db("cli_track_stdin");
    let remote = setup_test_db("cli_track_stdin_remote");
    init(&db, &remote);

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "track"])
        .write_stdin("# comment\n{not json}\n{\"type\":\"network\",\"reachable\":false}\n")
        .assert()
        .success()
        .stdout(contains("Ignoring invalid signal").and(contains("Agent stopped.")));
}

#[test]
fn test_db_info_and_check() {
    let db = setup_test_db("cli_db_info");
    let remote = setup_test_db("cli_db_info_remote");
    init(&db, &remote);

    rtrk()
        .args(["--db", &db, "db", "--info", "--check"])
        .assert()
        .success()
        .stdout(contains("Pending records").and(contains("Integrity check passed")));
}

#[test]
fn test_boot_requires_a_user() {
    let db = setup_test_db("cli_boot_nouser");
    let remote = setup_test_db("cli_boot_nouser_remote");
    init(&db, &remote);

    rtrk()
        .args(["--db", &db, "--remote-db", &remote, "boot"])
        .env("HOME", std::env::temp_dir())
        .assert()
        .failure()
        .stderr(contains("No user given"));
}
