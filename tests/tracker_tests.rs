// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run tracker filtering and lifecycle.

use fogwalk::geometry::{haversine_meters, GeoPoint};
use fogwalk::services::{FixOutcome, Rejection, RunState, RunTracker, TrackerConfig};

const T0: i64 = 1_700_000_000_000;
/// Meters per degree of latitude on the haversine sphere.
const METERS_PER_DEGREE: f64 = 111_194.926_644_558_7;

fn north_of(origin: &GeoPoint, meters: f64, t: i64) -> GeoPoint {
    GeoPoint::at(origin.lat + meters / METERS_PER_DEGREE, origin.lng, t)
}

fn running() -> RunTracker {
    let mut tracker = RunTracker::new(TrackerConfig::default());
    assert!(tracker.start(T0));
    tracker
}

#[test]
fn test_walking_pace_accepted_and_summarized() {
    let mut tracker = running();
    let p1 = GeoPoint::at(37.0, -122.0, T0);
    let p2 = north_of(&p1, 3.0, T0 + 2_000);
    assert!((haversine_meters(&p1, &p2) - 3.0).abs() < 1e-6);

    assert_eq!(
        tracker.accept_point(p1, None),
        FixOutcome::Accepted { step_meters: 0.0 }
    );
    assert!(tracker.accept_point(p2, None).is_accepted());

    let run = tracker.stop(T0 + 10_000).expect("two points make a run");
    assert!((run.distance_meters - 3.0).abs() < 1e-6);
    assert_eq!(run.points.len(), 2);
    assert_eq!(run.started_at, T0);
    assert_eq!(run.duration_ms(), 10_000);
    assert_eq!(tracker.state(), RunState::Idle);
}

#[test]
fn test_gps_jump_rejected_without_distance() {
    let mut tracker = running();
    let p1 = GeoPoint::at(37.0, -122.0, T0);
    let p2 = north_of(&p1, 200.0, T0 + 1_000);

    tracker.accept_point(p1, None);
    match tracker.accept_point(p2, None) {
        FixOutcome::Rejected(Rejection::GpsJump { speed_mps }) => {
            assert!((speed_mps - 200.0).abs() < 1e-3)
        }
        other => panic!("expected gps_jump, got {:?}", other),
    }
    assert_eq!(tracker.distance_meters(), 0.0);
    assert_eq!(tracker.path().len(), 1);
}

#[test]
fn test_jitter_rejected_as_too_small() {
    let mut tracker = running();
    let p1 = GeoPoint::at(37.0, -122.0, T0);
    tracker.accept_point(p1, None);

    let outcome = tracker.accept_point(north_of(&p1, 1.0, T0 + 5_000), None);
    assert!(matches!(
        outcome,
        FixOutcome::Rejected(Rejection::TooSmall { .. })
    ));
    assert_eq!(tracker.path().len(), 1);
}

#[test]
fn test_rejected_point_is_not_the_new_reference() {
    let mut tracker = running();
    let p1 = GeoPoint::at(37.0, -122.0, T0);
    tracker.accept_point(p1, None);
    // Jump, then a normal step measured from p1 rather than the jump.
    tracker.accept_point(north_of(&p1, 500.0, T0 + 1_000), None);
    let p3 = north_of(&p1, 20.0, T0 + 10_000);
    assert!(
        tracker.accept_point(p3, None).is_accepted(),
        "step should be measured from the last accepted point"
    );
    assert!((tracker.distance_meters() - 20.0).abs() < 1e-6);
}

#[test]
fn test_missing_timestamps_treated_as_one_millisecond() {
    let mut tracker = running();
    let p1 = GeoPoint::new(37.0, -122.0);
    tracker.accept_point(p1, None);
    // 3 m in "1 ms" is 3000 m/s.
    let p2 = GeoPoint::new(37.0 + 3.0 / METERS_PER_DEGREE, -122.0);
    assert!(matches!(
        tracker.accept_point(p2, None),
        FixOutcome::Rejected(Rejection::GpsJump { .. })
    ));
}

#[test]
fn test_false_start_discarded() {
    let mut tracker = running();
    tracker.accept_point(GeoPoint::at(37.0, -122.0, T0), None);
    assert!(tracker.stop(T0 + 1_000).is_none());
    assert!(tracker.path().is_empty());
    assert!(tracker.stop(T0 + 2_000).is_none());
}

#[test]
fn test_start_while_running_keeps_path() {
    let mut tracker = running();
    tracker.accept_point(GeoPoint::at(37.0, -122.0, T0), None);
    assert!(!tracker.start(T0 + 5_000));
    assert_eq!(tracker.path().len(), 1);
    assert_eq!(tracker.started_at(), Some(T0));
}

#[test]
fn test_accuracy_gate_is_opt_in() {
    let p = GeoPoint::at(37.0, -122.0, T0);

    let mut tracker = running();
    assert!(tracker.accept_point(p, Some(500.0)).is_accepted());

    let mut strict = RunTracker::new(TrackerConfig {
        max_accuracy_meters: Some(30.0),
        ..TrackerConfig::default()
    });
    strict.start(T0);
    assert_eq!(
        strict.accept_point(p, Some(45.0)),
        FixOutcome::Rejected(Rejection::LowAccuracy {
            accuracy_meters: 45.0
        })
    );
    assert!(strict.accept_point(p, Some(10.0)).is_accepted());
}

#[test]
fn test_rejection_codes() {
    assert_eq!(Rejection::NotRunning.code(), "not_running");
    assert_eq!(Rejection::GpsJump { speed_mps: 99.0 }.code(), "gps_jump");
    assert_eq!(
        Rejection::TooSmall {
            distance_meters: 0.5
        }
        .code(),
        "too_small"
    );
}

#[test]
fn test_extreme_timestamps_do_not_mask_a_jump() {
    let mut tracker = running();
    let p1 = GeoPoint::at(37.0, -122.0, T0);
    tracker.accept_point(p1, None);

    // Clock running backwards to the limit clamps to the 1 ms floor.
    let p2 = north_of(&p1, 11.0, i64::MIN);
    assert!(matches!(
        tracker.accept_point(p2, None),
        FixOutcome::Rejected(Rejection::GpsJump { .. })
    ));

    let p3 = north_of(&p1, 11.0, i64::MAX);
    assert!(tracker.accept_point(p3, None).is_accepted());
    let run = tracker.stop(T0 + 1_000).unwrap();
    assert_eq!(run.duration_ms(), 1_000);
}
