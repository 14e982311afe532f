//! # autoaim-tracker
//!
//! Tracking and state-estimation core for a turret-style robot aiming
//! system: a geometric model of an enemy robot as a rotating platform
//! carrying several armor plates, an extended-Kalman-filter fusion of
//! noisy per-plate pose observations into a 9-dimensional state, and the
//! finite-state machine governing detection, confirmation, maintenance,
//! and loss of a track.
//!
//! This crate contains pure tracking logic with **zero I/O dependencies**.
//! It does not perform coordinate-frame transformation, ballistic solving,
//! detection, or transport - those are external collaborators reached
//! through the [`pipeline::FrameTransformer`] and [`solver::BallisticSolver`]
//! trait seams.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  autoaim-tracker (pure logic, no tokio/async deps)                │
//! │  ├── ekf           (generic extended Kalman filter)               │
//! │  ├── motion_model   (9-state robot process/observation model)     │
//! │  ├── geometry       (armor-plate position derivation + matching)  │
//! │  ├── tracker        (LOST/DETECTING/TRACKING/TEMP_LOST FSM)       │
//! │  ├── solver         (BallisticSolver seam + publishing facade)    │
//! │  └── pipeline       (FrameTransformer seam + one-tick wiring)     │
//! └───────────────────────────────────────────────────────────────────┘
//!                 ▲                                  ▲
//!    ┌────────────┴────────────┐        ┌────────────┴────────────┐
//!    │  external frame         │        │  external ballistic     │
//!    │  transform library      │        │  solver                 │
//!    └──────────────────────────┘        └─────────────────────────┘
//! ```
//!
//! ## Key Modules
//!
//! - [`ekf`] - generic discrete extended Kalman filter over const-generic
//!   state/measurement dimensions
//! - [`motion_model`] - the concrete 9-state robot process/observation
//!   model, Jacobians, and noise providers
//! - [`geometry`] - per-plate position derivation and closest-match
//!   association
//! - [`tracker`] - the [`tracker::Tracker`] state machine wrapping the EKF
//! - [`solver`] - [`solver::SolverFacade`] publishing policy
//! - [`pipeline`] - [`pipeline::Pipeline`] tying transform, tracker, and
//!   solver together for one tick
//! - [`types`] - wire-level observation/snapshot/command types
//! - [`config`] - tracker and filter configuration, with documented
//!   defaults
//! - [`error`] - [`error::TrackError`] and [`error::EkfError`]
//!
//! ## Example: Feeding a Tracker
//!
//! ```
//! use autoaim_tracker::config::{EkfConfig, TrackerConfig};
//! use autoaim_tracker::tracker::Tracker;
//! use autoaim_tracker::types::{ArmorObservation, FrameHeader, ObservationBatch, PlateType};
//!
//! let mut tracker = Tracker::new(TrackerConfig::default(), EkfConfig::default());
//! let batch = ObservationBatch {
//!     header: FrameHeader { stamp: 0.0, frame_id: "odom".into() },
//!     armors: vec![ArmorObservation {
//!         numeric_id: "3".into(),
//!         position: (1.0, 0.0, 0.1),
//!         yaw: 0.0,
//!         plate_type: PlateType::Small,
//!     }],
//! };
//! tracker.step(&batch).unwrap();
//! assert!(tracker.tracked_id().is_some());
//! ```

pub mod config;
pub mod ekf;
pub mod error;
pub mod geometry;
pub mod motion_model;
pub mod pipeline;
pub mod solver;
pub mod tracker;
pub mod types;

pub use config::{Config, EkfConfig, TrackerConfig};
pub use error::{EkfError, TrackError};
pub use geometry::ArmorGeometry;
pub use pipeline::{FrameTransformer, Pipeline};
pub use solver::{BallisticSolver, SolverFacade};
pub use tracker::{Tracker, TrackerState};
pub use types::{
    ArmorObservation, FrameHeader, GimbalCommand, Measurement, ObservationBatch, PlateType,
    RawObservationBatch, TargetSnapshot,
};
