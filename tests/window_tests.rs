use chrono::NaiveTime;
use rtracklogger::core::geo::distance_m;
use rtracklogger::core::window::ActiveWindow;
use rtracklogger::models::position::Position;

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

#[test]
fn test_default_window_excludes_end_hour() {
    let w = ActiveWindow::default();
    assert!(!w.contains(at(7, 59)));
    assert!(w.contains(at(8, 0)));
    assert!(w.contains(at(17, 59)));
    assert!(!w.contains(at(18, 0)));
    assert!(!w.contains(at(19, 0)));
}

#[test]
fn test_inclusive_end_hour() {
    let w = ActiveWindow::new(8, 18, true);
    assert!(w.contains(at(18, 30)));
    assert!(!w.contains(at(19, 0)));
}

#[test]
fn test_window_wrapping_midnight() {
    let w = ActiveWindow::new(22, 6, false);
    assert!(w.contains(at(23, 15)));
    assert!(w.contains(at(0, 0)));
    assert!(w.contains(at(5, 59)));
    assert!(!w.contains(at(6, 0)));
    assert!(!w.contains(at(12, 0)));
}

#[test]
fn test_degenerate_window() {
    assert!(!ActiveWindow::new(9, 9, false).contains_hour(9));
    assert!(ActiveWindow::new(9, 9, true).contains_hour(9));
    assert!(!ActiveWindow::new(9, 9, true).contains_hour(10));
    assert!((0..24).all(|h| ActiveWindow::always().contains_hour(h)));
}

#[test]
fn test_haversine_distance() {
    let a = Position::new(45.0703, 7.6869);
    assert_eq!(distance_m(&a, &a), 0.0);

    // one degree of latitude is about 111.2 km
    let b = Position::new(46.0703, 7.6869);
    let d = distance_m(&a, &b);
    assert!((d - 111_195.0).abs() < 100.0, "got {d}");

    // symmetric
    assert!((distance_m(&b, &a) - d).abs() < 1e-6);
}

#[test]
fn test_coordinates_parsing() {
    let p = Position::from_coordinates("45.5, -7.25").expect("valid");
    assert_eq!(p, Position::new(45.5, -7.25));
    assert_eq!(p.coordinates(), "45.5,-7.25");

    assert!(Position::from_coordinates("91,0").is_err());
    assert!(Position::from_coordinates("0;0").is_err());
    assert!(Position::from_coordinates("abc,1").is_err());
    assert!(Position::checked(10.0, 181.0).is_err());
}
