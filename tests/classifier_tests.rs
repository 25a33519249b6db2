use chrono::Duration as ChronoDuration;
use rtracklogger::core::classifier::{Classification, ClassifierPolicy, MovementClassifier};
use rtracklogger::models::event_code::EventCode;
use rtracklogger::models::user_settings::UserSettings;
use std::time::Duration;

mod common;
use common::{fix_at, local, north_of};

const LAT: f64 = 45.0703;
const LON: f64 = 7.6869;

#[test]
fn test_first_fix_is_reported_as_same_place() {
    let mut c = MovementClassifier::new(ClassifierPolicy::default());
    let t0 = local(2026, 3, 2, 9, 0, 0);

    let out = c.observe(fix_at(LAT, LON, t0), t0).expect("first fix emits");
    assert_eq!(out.classification, Classification::FirstFix);
    assert_eq!(out.classification.code(), EventCode::Stationary);
    assert_eq!(out.position.latitude, LAT);
}

#[test]
fn test_nothing_emitted_before_interval() {
    let mut c = MovementClassifier::new(ClassifierPolicy::default());
    let t0 = local(2026, 3, 2, 9, 0, 0);
    c.observe(fix_at(LAT, LON, t0), t0);

    let t1 = t0 + ChronoDuration::seconds(30);
    assert!(c.observe(fix_at(LAT, LON, t1), t1).is_none());
    // the fix is still remembered
    assert_eq!(c.last_fix().map(|f| f.timestamp), Some(fix_at(LAT, LON, t1).timestamp));
}

#[test]
fn test_large_jump_before_interval_is_rate_limited() {
    let mut c = MovementClassifier::new(ClassifierPolicy::default());
    let t0 = local(2026, 3, 2, 9, 0, 0);
    c.observe(fix_at(LAT, LON, t0), t0);

    let t1 = t0 + ChronoDuration::seconds(10);
    assert!(c.observe(fix_at(north_of(LAT, 5_000.0), LON, t1), t1).is_none());
}

#[test]
fn test_stationary_after_interval_under_threshold() {
    let mut c = MovementClassifier::new(ClassifierPolicy::default());
    let t0 = local(2026, 3, 2, 9, 0, 0);
    c.observe(fix_at(LAT, LON, t0), t0);

    let t1 = t0 + ChronoDuration::seconds(60);
    let out = c
        .observe(fix_at(north_of(LAT, 40.0), LON, t1), t1)
        .expect("interval elapsed");
    assert_eq!(out.classification, Classification::Stationary);
    assert_eq!(out.classification.code().code(), 1);
}

#[test]
fn test_moving_after_interval_over_threshold() {
    let mut c = MovementClassifier::new(ClassifierPolicy::default());
    let t0 = local(2026, 3, 2, 9, 0, 0);
    c.observe(fix_at(LAT, LON, t0), t0);

    let t1 = t0 + ChronoDuration::seconds(61);
    let moved = north_of(LAT, 250.0);
    let out = c.observe(fix_at(moved, LON, t1), t1).expect("moved");
    assert_eq!(out.classification, Classification::Moving);
    assert_eq!(out.classification.code().code(), 2);

    // distances are now measured from the new anchor
    let t2 = t1 + ChronoDuration::seconds(61);
    let out = c.observe(fix_at(moved, LON, t2), t2).expect("interval elapsed");
    assert_eq!(out.classification, Classification::Stationary);
    assert_eq!(c.state().recorded_fix.map(|f| f.position.latitude), Some(moved));
}

#[test]
fn test_alternating_moves_emit_each_time() {
    let mut c = MovementClassifier::new(ClassifierPolicy::default());
    let mut t = local(2026, 3, 2, 10, 0, 0);
    c.observe(fix_at(LAT, LON, t), t);

    let far = north_of(LAT, 300.0);
    for i in 0..4 {
        t += ChronoDuration::seconds(90);
        let lat = if i % 2 == 0 { far } else { LAT };
        let out = c.observe(fix_at(lat, LON, t), t).expect("emits");
        assert_eq!(out.classification, Classification::Moving);
    }
}

#[test]
fn test_backwards_clock_does_not_emit() {
    let mut c = MovementClassifier::new(ClassifierPolicy::default());
    let t0 = local(2026, 3, 2, 9, 0, 0);
    c.observe(fix_at(LAT, LON, t0), t0);

    let earlier = t0 - ChronoDuration::minutes(10);
    assert!(!c.interval_elapsed(earlier));
    c.mark_emitted(earlier);
    assert_eq!(c.state().last_emitted_at, Some(t0));
}

#[test]
fn test_user_settings_override_policy() {
    let base = ClassifierPolicy::default();

    let tuned = base.with_settings(Some(UserSettings {
        wait_interval: 300,
        movement_threshold: 50,
    }));
    assert_eq!(tuned.min_interval, Duration::from_secs(300));
    assert_eq!(tuned.movement_threshold_m, 50.0);

    let ignored = base.with_settings(Some(UserSettings {
        wait_interval: 0,
        movement_threshold: -1,
    }));
    assert_eq!(ignored, base);
    assert_eq!(base.with_settings(None), base);
}
