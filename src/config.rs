//! Immutable configuration, read once at startup and passed by reference.
//!
//! Mirrors `mayara_core::arpa::types::ArpaSettings`: plain `serde` structs
//! with a `Default` impl carrying the documented defaults, loadable from
//! JSON by whoever owns process startup. This crate does not watch files
//! or parse CLI flags - that belongs to the binary that embeds it.

use serde::{Deserialize, Serialize};

/// Tracker FSM and association configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Gate, in meters, for observation/prediction association.
    pub max_match_distance: f64,
    /// Yaw gate, in radians, distinguishing same-plate updates from an
    /// armor jump.
    pub max_match_yaw_diff: f64,
    /// Number of consecutive associated frames required to confirm
    /// DETECTING -> TRACKING.
    pub tracking_thres: u32,
    /// Time budget, in seconds, for TEMP_LOST -> LOST.
    pub lost_time_thres: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            max_match_distance: 0.2,
            max_match_yaw_diff: 1.0,
            tracking_thres: 5,
            lost_time_thres: 0.3,
        }
    }
}

/// Extended Kalman filter noise configuration for the 9-state robot motion
/// model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EkfConfig {
    /// Process spectral density for the center x/y axes.
    pub sigma2_q_x: f64,
    pub sigma2_q_y: f64,
    /// Process spectral density for the observed-plate height axis.
    pub sigma2_q_z: f64,
    /// Process spectral density for the observed-plate yaw axis.
    pub sigma2_q_yaw: f64,
    /// Process spectral density for the radius random walk.
    pub sigma2_q_r: f64,
    /// Measurement noise scale for x, scaled by `|z_x|`.
    pub r_x: f64,
    /// Measurement noise scale for y, scaled by `|z_y|`.
    pub r_y: f64,
    /// Measurement noise scale for z, scaled by `|z_z|`.
    pub r_z: f64,
    /// Measurement noise for yaw (not distance-scaled).
    pub r_yaw: f64,
}

impl Default for EkfConfig {
    fn default() -> Self {
        EkfConfig {
            sigma2_q_x: 20.0,
            sigma2_q_y: 20.0,
            sigma2_q_z: 20.0,
            sigma2_q_yaw: 100.0,
            sigma2_q_r: 800.0,
            r_x: 0.05,
            r_y: 0.05,
            r_z: 0.05,
            r_yaw: 0.02,
        }
    }
}

/// Top-level configuration bundle for the tracking core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub tracker: TrackerConfig,
    pub ekf: EkfConfig,
    /// World frame the upstream transform expresses observations in.
    /// Carried through for downstream publication; the tracker itself is
    /// frame-agnostic.
    #[serde(default = "default_target_frame")]
    pub target_frame: String,
}

fn default_target_frame() -> String {
    "odom".to_string()
}

impl Config {
    /// Parse a configuration bundle from a JSON document.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
