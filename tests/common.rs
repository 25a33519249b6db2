#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, Local, TimeZone, Utc};
use rtracklogger::core::outbox::Outbox;
use rtracklogger::models::event_code::EventCode;
use rtracklogger::models::location_event::LocationEvent;
use rtracklogger::models::position::{Fix, Position};
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn rtrk() -> Command {
    let mut cmd = cargo_bin_cmd!("rtracklogger");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtracklogger.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    fs::remove_file(format!("{db_path}-wal")).ok();
    fs::remove_file(format!("{db_path}-shm")).ok();
    db_path
}

/// Create a temporary file path inside tempdir and ensure it's removed
pub fn temp_file(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtracklogger.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn fresh_outbox(name: &str) -> Outbox {
    Outbox::open(setup_test_db(name)).expect("open outbox")
}

pub fn local(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, m, d, h, mi, s)
        .earliest()
        .expect("valid local time")
}

pub fn fix_at(lat: f64, lon: f64, at: DateTime<Local>) -> Fix {
    Fix::new(lat, lon, at.with_timezone(&Utc))
}

pub fn event(user_id: i64, code: EventCode, at: DateTime<Local>) -> LocationEvent {
    LocationEvent::new(user_id, Position::new(45.0703, 7.6869), code, at)
}

/// Roughly `meters` north of `lat`.
pub fn north_of(lat: f64, meters: f64) -> f64 {
    lat + meters / 111_195.0
}
