//! Wire-level data types: armor observations in, measurements/snapshots/
//! gimbal commands out. Mirrors the way `mayara_core::arpa::types` models
//! its SignalK-facing API - plain serde structs with camelCase wire names.

use serde::{Deserialize, Serialize};

use crate::error::TrackError;

/// Plate size. Affects downstream ballistic geometry only; the tracker
/// itself never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateType {
    Small,
    Large,
}

/// A single armor-plate detection, already expressed in the fixed world
/// frame by the external transform step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorObservation {
    /// Robot-type identity string produced by the detector (e.g. "1".."7",
    /// "guard", "base").
    pub numeric_id: String,
    /// World-frame position (x, y, z) in meters.
    pub position: (f64, f64, f64),
    /// World-frame yaw of the plate, in radians.
    pub yaw: f64,
    pub plate_type: PlateType,
}

impl ArmorObservation {
    /// Checks the tracker's input invariant: finite position and
    /// orientation, `|z| <= 2m` (`spec.md` §3, §7 "BadObservation").
    pub fn validate(&self) -> Result<(), TrackError> {
        let (x, y, z) = self.position;
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            return Err(TrackError::BadObservation {
                reason: "non-finite position".to_string(),
            });
        }
        if !self.yaw.is_finite() {
            return Err(TrackError::BadObservation {
                reason: "non-finite yaw".to_string(),
            });
        }
        if z.abs() > 2.0 {
            return Err(TrackError::BadObservation {
                reason: format!("|z| = {} exceeds 2m", z.abs()),
            });
        }
        Ok(())
    }

    /// `true` when [`Self::validate`] accepts the observation.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn distance_from_origin(&self) -> f64 {
        let (x, y, z) = self.position;
        (x * x + y * y + z * z).sqrt()
    }
}

/// Header shared by a batch of observations from one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameHeader {
    /// Frame timestamp, seconds.
    pub stamp: f64,
    pub frame_id: String,
}

/// One frame's worth of detections, as delivered to the tracker after the
/// external frame transform has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBatch {
    pub header: FrameHeader,
    pub armors: Vec<ArmorObservation>,
}

impl ObservationBatch {
    /// Observations that pass [`ArmorObservation::is_valid`]. Anything
    /// else is discarded silently per `spec.md` §4 ("BadObservation").
    pub fn valid_armors(&self) -> impl Iterator<Item = &ArmorObservation> {
        self.armors.iter().filter(|a| a.is_valid())
    }

    /// Among valid observations matching `numeric_id`, the one closest to
    /// the origin. Used by `Tracker::init` and documents the tie-break
    /// rule from `spec.md` §8 invariant 5.
    pub fn closest_matching(&self, numeric_id: &str) -> Option<&ArmorObservation> {
        self.valid_armors()
            .filter(|a| a.numeric_id == numeric_id)
            .min_by(|a, b| {
                a.distance_from_origin()
                    .partial_cmp(&b.distance_from_origin())
                    .expect("distances are finite for valid observations")
            })
    }

    /// The first valid observation, irrespective of id - used to pick an
    /// id to initialize a track on.
    pub fn first_valid(&self) -> Option<&ArmorObservation> {
        self.valid_armors().next()
    }
}

/// Untransformed observation batch, as produced by the upstream detector
/// before the external frame-transform step runs. Same shape as
/// [`ObservationBatch`]; kept as a distinct type purely to document the
/// input contract of [`crate::pipeline::FrameTransformer`] - this crate
/// does not implement the transform itself.
pub type RawObservationBatch = ObservationBatch;

/// The 4-vector actually consumed by the last EKF update, published for
/// diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub stamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

/// Per-tick snapshot of the tracked target, published regardless of FSM
/// state. Fields beyond `tracking` are only meaningful when it is `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSnapshot {
    pub stamp: f64,
    pub frame_id: String,
    pub tracking: bool,
    pub id: String,
    pub armors_num: u8,
    pub position: (f64, f64, f64),
    pub velocity: (f64, f64, f64),
    pub yaw: f64,
    pub v_yaw: f64,
    pub radius_1: f64,
    pub radius_2: f64,
    pub dz: f64,
}

impl TargetSnapshot {
    /// The inactive snapshot published whenever the tracker is not in
    /// TRACKING or TEMP_LOST.
    pub fn not_tracking(stamp: f64, frame_id: String) -> Self {
        TargetSnapshot {
            stamp,
            frame_id,
            tracking: false,
            id: String::new(),
            armors_num: 0,
            position: (0.0, 0.0, 0.0),
            velocity: (0.0, 0.0, 0.0),
            yaw: 0.0,
            v_yaw: 0.0,
            radius_1: 0.0,
            radius_2: 0.0,
            dz: 0.0,
        }
    }
}

/// Gimbal aim command emitted every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GimbalCommand {
    pub yaw_diff: f64,
    pub pitch_diff: f64,
    pub distance: f64,
    pub fire_advice: bool,
}

impl GimbalCommand {
    /// The neutral command emitted when not tracking, or when the
    /// downstream solver fails.
    pub const NEUTRAL: GimbalCommand = GimbalCommand {
        yaw_diff: 0.0,
        pitch_diff: 0.0,
        distance: -1.0,
        fire_advice: false,
    };
}
