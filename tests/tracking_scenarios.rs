//! Black-box end-to-end scenarios driving [`Tracker`] across multiple
//! ticks, covering each walkthrough in the component design.

use approx::assert_abs_diff_eq;
use std::f64::consts::PI;

use autoaim_tracker::config::{EkfConfig, TrackerConfig};
use autoaim_tracker::tracker::{Tracker, TrackerState};
use autoaim_tracker::types::{ArmorObservation, FrameHeader, ObservationBatch, PlateType};

fn armor(id: &str, position: (f64, f64, f64), yaw: f64) -> ArmorObservation {
    ArmorObservation {
        numeric_id: id.to_string(),
        position,
        yaw,
        plate_type: PlateType::Small,
    }
}

fn batch(stamp: f64, armors: Vec<ArmorObservation>) -> ObservationBatch {
    ObservationBatch {
        header: FrameHeader {
            stamp,
            frame_id: "odom".to_string(),
        },
        armors,
    }
}

/// The position the observation model predicts for the tracked (i=0)
/// plate of a just-initialized, motionless track: `xc - r*cos(yaw)`,
/// `yc - r*sin(yaw)`, `za`. Feeding this back in keeps every later tick an
/// exact-innovation update, so association keeps succeeding without
/// depending on several iterations of Kalman convergence.
fn steady_plate0(xc: f64, yc: f64, za: f64, yaw: f64, r: f64) -> (f64, f64, f64) {
    (xc - r * yaw.cos(), yc - r * yaw.sin(), za)
}

const R_INIT: f64 = 0.26;

/// Drives `tracker` from LOST to TRACKING: one init tick at `(xc, yc, za,
/// yaw)`, then enough steady-state ticks to satisfy `tracking_thres`
/// (default 5, so 4 more ticks after the init tick). Returns the stamp of
/// the last tick run.
fn confirm_tracking(
    tracker: &mut Tracker,
    id: &str,
    xc: f64,
    yc: f64,
    za: f64,
    yaw: f64,
    dt: f64,
) -> f64 {
    let mut stamp = 0.0;
    tracker
        .step(&batch(stamp, vec![armor(id, (xc, yc, za), yaw)]))
        .unwrap();

    let steady = steady_plate0(xc, yc, za, yaw, R_INIT);
    for _ in 0..4 {
        stamp += dt;
        tracker
            .step(&batch(stamp, vec![armor(id, steady, yaw)]))
            .unwrap();
    }
    stamp
}

#[test]
fn cold_start_moves_lost_to_detecting() {
    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    tracker
        .step(&batch(0.0, vec![armor("3", (1.0, 0.0, 0.1), 0.0)]))
        .unwrap();

    assert_eq!(tracker.state(), TrackerState::Detecting);
    let snap = tracker.snapshot(0.0, "odom");
    assert!(!snap.tracking);
    let m = tracker.last_measurement().unwrap();
    assert_abs_diff_eq!(m.x, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(m.y, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(m.z, 0.1, epsilon = 1e-9);
}

#[test]
fn five_consistent_detections_confirm_tracking() {
    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    confirm_tracking(&mut tracker, "3", 1.0, 0.0, 0.1, 0.0, 0.1);
    assert_eq!(tracker.state(), TrackerState::Tracking);
}

#[test]
fn missed_detections_drive_temp_lost_then_lost() {
    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    let dt = 0.1;
    let mut stamp = confirm_tracking(&mut tracker, "3", 1.0, 0.0, 0.1, 0.0, dt);
    assert_eq!(tracker.state(), TrackerState::Tracking);

    stamp += dt;
    tracker.step(&batch(stamp, vec![])).unwrap();
    assert_eq!(tracker.state(), TrackerState::TempLost);

    // lost_time_thres defaults to 0.3s, dt = 0.1s -> lost_thres = 3 frames;
    // keep missing until the tracker gives up.
    let mut last_state = tracker.state();
    for _ in 0..10 {
        if tracker.state() == TrackerState::Lost {
            break;
        }
        stamp += dt;
        tracker.step(&batch(stamp, vec![])).unwrap();
        last_state = tracker.state();
    }
    assert_eq!(last_state, TrackerState::Lost);
    assert_eq!(tracker.tracked_id(), None);
}

#[test]
fn armor_jump_preserves_radius_and_height_geometry() {
    // Robot "2" maps to armors_num = 4 via the type table.
    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    let dt = 0.1;
    let stamp = confirm_tracking(&mut tracker, "2", 1.0, 0.0, 0.1, 0.0, dt);
    assert_eq!(tracker.state(), TrackerState::Tracking);

    // i=1 plate (yaw = pi/2, radius = another_r = r = 0.26 pre-jump) sits
    // at (xc, yc - r, za).
    let jump_position = (1.0, -R_INIT, 0.1);
    tracker
        .step(&batch(
            stamp + dt,
            vec![armor("2", jump_position, PI / 2.0)],
        ))
        .unwrap();

    assert!(tracker.state().is_active());
    let snap = tracker.snapshot(stamp + dt, "odom");
    assert_abs_diff_eq!(snap.yaw, PI / 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(snap.radius_1, R_INIT, epsilon = 1e-6);
    assert_abs_diff_eq!(snap.radius_2, R_INIT, epsilon = 1e-6);
}

/// The previous test alone cannot distinguish a correct radius/height swap
/// from a no-op: starting from a symmetric pre-jump state (r == another_r,
/// dz == 0), either behavior produces the same post-jump snapshot. This
/// test first forces the track into a genuinely asymmetric state (feeding
/// an observation at the handover that implies a radius other than the
/// steady-state 0.26), then drives a *second* jump, continuing the same
/// rotation, and checks the involution law from `spec.md` §8: two jumps
/// swap radius_1/radius_2 back, so the second jump's output must recover
/// the first jump's (now known, asymmetric) pre-jump pair.
#[test]
fn second_armor_jump_recovers_first_jumps_asymmetric_geometry() {
    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    let dt = 0.1;
    let stamp = confirm_tracking(&mut tracker, "2", 1.0, 0.0, 0.1, 0.0, dt);
    assert_eq!(tracker.state(), TrackerState::Tracking);

    // First jump to yaw = pi/2. The observed y is 0.30 away from center
    // rather than the steady 0.26, so the update pulls radius_1 away from
    // radius_2 (which stays frozen at the pre-jump 0.26 until the next
    // jump touches it) instead of leaving them equal.
    let jump1_stamp = stamp + dt;
    tracker
        .step(&batch(
            jump1_stamp,
            vec![armor("2", (1.0, -0.30, 0.1), PI / 2.0)],
        ))
        .unwrap();
    assert!(tracker.state().is_active());

    let snap1 = tracker.snapshot(jump1_stamp, "odom");
    assert_abs_diff_eq!(snap1.yaw, PI / 2.0, epsilon = 1e-6);
    // Confirm the precondition the first test couldn't: geometry is now
    // genuinely asymmetric, not the degenerate r == another_r case.
    assert!(
        (snap1.radius_1 - snap1.radius_2).abs() > 0.005,
        "expected jump1 to desynchronize radius_1/radius_2, got r={} another_r={}",
        snap1.radius_1,
        snap1.radius_2
    );

    // Second jump, continuing the same rotation to yaw = pi. Feed the
    // observation the swap itself predicts for plate index 1 given the
    // *current* (asymmetric) state, so this tick's own update contributes
    // little beyond the swap: xa = xc - r*cos(pi) = xc + r, ya = yc -
    // r*sin(pi) = yc (sin(pi) = 0, so ya doesn't depend on r at all here).
    let jump2_stamp = jump1_stamp + dt;
    let jump2_position = (
        snap1.position.0 + snap1.radius_2,
        snap1.position.1,
        snap1.position.2,
    );
    tracker
        .step(&batch(jump2_stamp, vec![armor("2", jump2_position, PI)]))
        .unwrap();
    assert!(tracker.state().is_active());

    let snap2 = tracker.snapshot(jump2_stamp, "odom");
    assert_abs_diff_eq!(snap2.yaw, PI, epsilon = 1e-6);
    // Involution: the second jump's radius_1/radius_2 recover what the
    // first jump produced, swapped back.
    assert_abs_diff_eq!(snap2.radius_1, snap1.radius_2, epsilon = 0.05);
    assert_abs_diff_eq!(snap2.radius_2, snap1.radius_1, epsilon = 0.05);
}

#[test]
fn outlier_far_from_every_plate_is_treated_as_miss() {
    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    let dt = 0.1;
    let stamp = confirm_tracking(&mut tracker, "3", 1.0, 0.0, 0.1, 0.0, dt);
    assert_eq!(tracker.state(), TrackerState::Tracking);

    // 1m+ away from every predicted plate, well past max_match_distance (0.2m).
    tracker
        .step(&batch(stamp + dt, vec![armor("3", (2.0, 1.0, 0.1), 0.0)]))
        .unwrap();
    assert_eq!(tracker.state(), TrackerState::TempLost);
}

#[test]
fn yaw_wraps_without_a_discontinuity() {
    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    tracker
        .step(&batch(0.0, vec![armor("3", (1.0, 0.0, 0.1), 3.10)]))
        .unwrap();
    let before = tracker.last_measurement().unwrap().yaw;
    assert_abs_diff_eq!(before, 3.10, epsilon = 1e-9);

    // Position consistent with the observation model at (xc=1.0, yc=0,
    // za=0.1, yaw=3.10, r=0.26), so this tick associates cleanly and
    // isolates the yaw-unwrap behavior from position gating.
    let steady = steady_plate0(1.0, 0.0, 0.1, 3.10, R_INIT);
    tracker
        .step(&batch(0.1, vec![armor("3", steady, -3.10)]))
        .unwrap();
    let after = tracker.last_measurement().unwrap().yaw;
    // -3.10 unwrapped against 3.10 becomes 2*pi - 3.10 ~= 3.18, not -3.10.
    assert_abs_diff_eq!(after, 2.0 * PI - 3.10, epsilon = 1e-9);
}
