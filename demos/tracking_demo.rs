//! Drives a synthetic detection stream through [`Tracker`] end to end,
//! logging every FSM transition via `env_logger`.
//!
//! Run with `RUST_LOG=debug cargo run --example tracking_demo` to see the
//! LOST -> DETECTING -> TRACKING -> TEMP_LOST -> TRACKING progression.

use autoaim_tracker::config::{EkfConfig, TrackerConfig};
use autoaim_tracker::tracker::Tracker;
use autoaim_tracker::types::{ArmorObservation, FrameHeader, ObservationBatch, PlateType};

fn observation(id: &str, position: (f64, f64, f64), yaw: f64) -> ArmorObservation {
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

/// The world position the observation model predicts for the tracked
/// (i=0) plate of a motionless track at `(xc, yc, za, yaw)`: `init()`
/// copies a raw detection straight into filter state, but every later
/// tick is matched against `xc - r*cos(yaw)`, `yc - r*sin(yaw)`, `za`, so
/// a synthetic stream has to aim at this point (not the raw center) to
/// keep associating once the track exists.
fn steady_plate0(xc: f64, yc: f64, za: f64, yaw: f64, r: f64) -> (f64, f64, f64) {
    (xc - r * yaw.cos(), yc - r * yaw.sin(), za)
}

fn main() {
    env_logger::init();

    let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
    let dt = 0.1;
    let mut stamp = 0.0;
    let r_init = 0.26;
    let steady = steady_plate0(1.0, 0.0, 0.1, 0.0, r_init);

    // Cold start: one raw detection moves LOST -> DETECTING.
    tracker
        .step(&batch(stamp, vec![observation("3", (1.0, 0.0, 0.1), 0.0)]))
        .expect("monotonic ticks");
    println!("t={stamp:.1} state={:?}", tracker.state());

    // Four more steady-state detections confirm the track: DETECTING ->
    // TRACKING (tracking_thres defaults to 5 total).
    for _ in 0..4 {
        stamp += dt;
        tracker
            .step(&batch(stamp, vec![observation("3", steady, 0.0)]))
            .expect("monotonic ticks");
        println!("t={stamp:.1} state={:?}", tracker.state());
    }

    // A few ticks with nothing detected: TRACKING -> TEMP_LOST, state
    // advances by prediction alone.
    for _ in 0..3 {
        stamp += dt;
        tracker.step(&batch(stamp, vec![])).expect("monotonic ticks");
        let snapshot = tracker.snapshot(stamp, "odom");
        println!(
            "t={stamp:.1} state={:?} position={:?}",
            tracker.state(),
            snapshot.position
        );
    }

    // Detection resumes at the propagated prediction: TEMP_LOST -> TRACKING.
    stamp += dt;
    tracker
        .step(&batch(stamp, vec![observation("3", steady, 0.0)]))
        .expect("monotonic ticks");
    println!("t={stamp:.1} state={:?}", tracker.state());
}
