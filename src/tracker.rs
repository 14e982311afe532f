//! Tracking state machine: LOST -> DETECTING -> TRACKING <-> TEMP_LOST.
//!
//! Wraps the [`crate::ekf::ExtendedKalmanFilter`] with initialization,
//! per-tick association against [`crate::geometry::ArmorGeometry`], armor-
//! jump handling, and outlier rejection. Grounded on
//! `mayara_core::arpa::target::refresh_target` (a single function driving
//! a status enum through acquisition states with lost-count bookkeeping)
//! and `mayara_core::connection::ConnectionManager` (a small owned FSM
//! struct with an explicit transition table and `matches!`-based state
//! queries).

use nalgebra::SVector;

use crate::config::{EkfConfig, TrackerConfig};
use crate::error::TrackError;
use crate::geometry::{unwrap_yaw, ArmorGeometry};
use crate::motion_model::{RobotMotionModel, NX, NZ, R, R_MAX, R_MIN, YAW};
use crate::types::{ArmorObservation, Measurement, ObservationBatch, TargetSnapshot};
use std::cell::Cell;
use std::rc::Rc;

/// Tracking FSM state (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No track. Terminal on loss, initial at construction.
    Lost,
    /// A candidate track is accumulating consecutive associated frames.
    Detecting,
    /// Confirmed track, updating every tick an observation associates.
    Tracking,
    /// Track briefly without an associating observation; state is
    /// propagated by prediction alone.
    TempLost,
}

impl TrackerState {
    /// Whether a [`TargetSnapshot`] should report `tracking = true`.
    pub fn is_active(&self) -> bool {
        matches!(self, TrackerState::Tracking | TrackerState::TempLost)
    }
}

/// How the current tick's observation (if any) was resolved against the
/// prediction. Exposed mainly for tests and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssociationOutcome {
    SamePlate,
    ArmorJump,
    Miss,
}

/// The tracking and state-estimation core for a single enemy robot.
pub struct Tracker {
    tracker_config: TrackerConfig,
    filter: crate::ekf::ExtendedKalmanFilter<NX, NZ>,
    dt_cell: Rc<Cell<f64>>,

    state: TrackerState,
    tracked_id: Option<String>,
    tracked_armors_num: u8,
    another_r: f64,
    dz: f64,
    last_yaw: f64,

    detect_count: u32,
    lost_count: u32,

    last_stamp: Option<f64>,
    last_measurement: Option<Measurement>,
}

impl Tracker {
    /// A fresh, LOST tracker.
    pub fn new(tracker_config: TrackerConfig, ekf_config: EkfConfig) -> Self {
        let (filter, dt_cell) = RobotMotionModel::build(&ekf_config);
        Tracker {
            tracker_config,
            filter,
            dt_cell,
            state: TrackerState::Lost,
            tracked_id: None,
            tracked_armors_num: 0,
            another_r: 0.0,
            dz: 0.0,
            last_yaw: 0.0,
            detect_count: 0,
            lost_count: 0,
            last_stamp: None,
            last_measurement: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn tracked_id(&self) -> Option<&str> {
        self.tracked_id.as_deref()
    }

    pub fn last_measurement(&self) -> Option<Measurement> {
        self.last_measurement
    }

    fn geometry(&self) -> ArmorGeometry {
        ArmorGeometry::new(self.tracked_armors_num, self.another_r, self.dz)
    }

    /// Advance the tracker by one tick. `batch.header.stamp` must be
    /// strictly greater than the previous tick's, or the tick is dropped
    /// (`spec.md` §5 ordering rule).
    pub fn step(&mut self, batch: &ObservationBatch) -> Result<(), TrackError> {
        let stamp = batch.header.stamp;
        let dt = match self.last_stamp {
            Some(prev) => stamp - prev,
            None => 0.0,
        };
        if self.last_stamp.is_some() && dt <= 0.0 {
            log::warn!("dropping tick: non-monotonic dt = {dt}");
            return Err(TrackError::NonMonotonicTick { dt });
        }
        self.dt_cell.set(dt);

        match self.state {
            TrackerState::Lost => self.step_lost(batch),
            TrackerState::Detecting => self.step_detecting(batch),
            TrackerState::Tracking => self.step_tracking(batch),
            TrackerState::TempLost => self.step_temp_lost(batch),
        }

        self.last_stamp = Some(stamp);
        Ok(())
    }

    fn step_lost(&mut self, batch: &ObservationBatch) {
        if let Some(obs) = batch.first_valid() {
            if self.init(obs.clone(), batch) {
                self.state = TrackerState::Detecting;
                // init()'s observation counts as the first of the
                // consecutive detections tracking_thres counts.
                self.detect_count = 1;
                log::info!("LOST -> DETECTING (id={})", obs.numeric_id);
            }
        }
    }

    fn step_detecting(&mut self, batch: &ObservationBatch) {
        match self.associate_and_update(batch) {
            AssociationOutcome::SamePlate | AssociationOutcome::ArmorJump => {
                self.detect_count += 1;
                if self.detect_count >= self.tracker_config.tracking_thres {
                    self.state = TrackerState::Tracking;
                    self.detect_count = 0;
                    log::info!("DETECTING -> TRACKING (id={:?})", self.tracked_id);
                }
            }
            AssociationOutcome::Miss => {
                self.detect_count = 0;
                self.state = TrackerState::Lost;
                self.reset_track();
                log::debug!("DETECTING -> LOST (no association)");
            }
        }
    }

    fn step_tracking(&mut self, batch: &ObservationBatch) {
        match self.associate_and_update(batch) {
            AssociationOutcome::SamePlate | AssociationOutcome::ArmorJump => {}
            AssociationOutcome::Miss => {
                self.state = TrackerState::TempLost;
                self.lost_count = 1;
                log::debug!("TRACKING -> TEMP_LOST");
            }
        }
    }

    fn step_temp_lost(&mut self, batch: &ObservationBatch) {
        let lost_thres = self.lost_thres(self.dt_cell.get());
        match self.associate_and_update(batch) {
            AssociationOutcome::SamePlate | AssociationOutcome::ArmorJump => {
                self.lost_count = 0;
                self.state = TrackerState::Tracking;
                log::debug!("TEMP_LOST -> TRACKING");
            }
            AssociationOutcome::Miss => {
                // associate_and_update() already predicted and, finding no
                // association, committed the prediction as the new
                // posterior: this tick propagates by prediction alone.
                self.lost_count += 1;
                if self.lost_count > lost_thres {
                    self.state = TrackerState::Lost;
                    self.reset_track();
                    log::info!("TEMP_LOST -> LOST (lost_count exceeded threshold)");
                }
            }
        }
    }

    /// `lost_thres = |lost_time_thres / dt|`, converting the configured
    /// time budget into a frame count. Guards against `dt == 0`.
    fn lost_thres(&self, dt: f64) -> u32 {
        if dt.abs() < f64::EPSILON {
            return u32::MAX;
        }
        (self.tracker_config.lost_time_thres / dt).abs() as u32
    }

    /// `spec.md` §4.4 `init()`: accepts unconditionally given any valid
    /// observation, selecting the one closest to the origin when several
    /// share the same id as the first candidate.
    fn init(&mut self, candidate: ArmorObservation, batch: &ObservationBatch) -> bool {
        let obs = batch
            .closest_matching(&candidate.numeric_id)
            .unwrap_or(&candidate);

        let (x, y, z) = obs.position;
        self.filter
            .set_state(RobotMotionModel::initial_state(x, y, z, obs.yaw));
        self.tracked_id = Some(obs.numeric_id.clone());
        self.tracked_armors_num = crate::geometry::robot_type_table(&obs.numeric_id);
        self.another_r = crate::motion_model::R_INIT;
        self.dz = 0.0;
        self.last_yaw = obs.yaw;
        self.last_measurement = Some(Measurement {
            stamp: batch.header.stamp,
            x,
            y,
            z,
            yaw: obs.yaw,
        });
        true
    }

    fn reset_track(&mut self) {
        self.tracked_id = None;
        self.tracked_armors_num = 0;
        self.another_r = 0.0;
        self.dz = 0.0;
        self.last_yaw = 0.0;
        self.lost_count = 0;
        self.last_measurement = None;
    }

    /// Predict, then associate the best candidate observation against the
    /// predicted plate geometry, and update (or treat as a miss).
    fn associate_and_update(&mut self, batch: &ObservationBatch) -> AssociationOutcome {
        self.filter.predict();

        let tracked_id = match &self.tracked_id {
            Some(id) => id.clone(),
            None => {
                self.filter.commit_prediction();
                self.clamp_and_sync_yaw();
                return AssociationOutcome::Miss;
            }
        };

        let x_pred = *self.filter.predicted_state();
        let geometry = self.geometry();

        let mut best: Option<(f64, usize, f64, &ArmorObservation)> = None;
        for obs in batch.valid_armors().filter(|o| o.numeric_id == tracked_id) {
            let (idx, dist, plate_yaw) = geometry.best_match(&x_pred, obs.position);
            if best.as_ref().map(|b| dist < b.0).unwrap_or(true) {
                best = Some((dist, idx, plate_yaw, obs));
            }
        }

        let Some((d_min, idx, _plate_yaw, obs)) = best else {
            self.filter.commit_prediction();
            self.clamp_and_sync_yaw();
            return AssociationOutcome::Miss;
        };

        if d_min >= self.tracker_config.max_match_distance {
            self.filter.commit_prediction();
            self.clamp_and_sync_yaw();
            return AssociationOutcome::Miss;
        }

        let expected0 = RobotMotionModel::expected_plate0(&x_pred);
        let yaw_unwrapped = unwrap_yaw(obs.yaw, self.last_yaw);
        let yaw_diff = (yaw_unwrapped - expected0[3]).abs();

        let outcome = if idx == 0 && yaw_diff < self.tracker_config.max_match_yaw_diff {
            AssociationOutcome::SamePlate
        } else {
            AssociationOutcome::ArmorJump
        };

        if outcome == AssociationOutcome::ArmorJump {
            self.apply_armor_jump(&x_pred, yaw_unwrapped);
        }

        let (ox, oy, oz) = obs.position;
        let z = SVector::<f64, NZ>::new(ox, oy, oz, yaw_unwrapped);
        match self.filter.update(&z) {
            Ok(_) => {
                self.clamp_and_sync_yaw();
                self.last_measurement = Some(Measurement {
                    stamp: batch.header.stamp,
                    x: ox,
                    y: oy,
                    z: oz,
                    yaw: yaw_unwrapped,
                });
                outcome
            }
            Err(e) => {
                // update() already rolled the filter's posterior back to
                // x_pred on a singular innovation covariance or a
                // non-finite result, so no extra commit is needed here -
                // only the yaw/radius bookkeeping.
                log::warn!("filter rejected measurement: {e}");
                self.clamp_and_sync_yaw();
                AssociationOutcome::Miss
            }
        }
    }

    /// The robot has rotated past a plate handover: swap `r`/`another_r`
    /// and the two height levels, and move the yaw reference to the newly
    /// observed plate, so it becomes the new `i = 0` reference
    /// (`spec.md` §4.4).
    fn apply_armor_jump(&mut self, x_pred: &crate::motion_model::RobotState, new_yaw: f64) {
        let mut x = *x_pred;
        let old_r = x[R];
        let old_za = x[crate::motion_model::ZA];

        x[R] = self.another_r;
        self.another_r = old_r;

        // dz = za_new - za_old; keep it a stable per-robot constant by
        // flipping its sign across the handover.
        x[crate::motion_model::ZA] = old_za + self.dz;
        self.dz = -self.dz;

        x[YAW] = new_yaw;
        // Only x_pred needs to reflect the jumped geometry: update() reads
        // x_pred (not the stale posterior) to compute H and the
        // innovation, and will produce a fresh posterior from it.
        self.filter.set_predicted_state(x);
    }

    fn clamp_and_sync_yaw(&mut self) {
        let x = *self.filter.state();
        let r_clamped = x[R].clamp(R_MIN, R_MAX);
        if (r_clamped - x[R]).abs() > f64::EPSILON {
            let mut fixed = x;
            fixed[R] = r_clamped;
            self.filter.set_posterior_state(fixed);
        }
        self.last_yaw = self.filter.state()[YAW];
    }

    /// Build the current [`TargetSnapshot`], regardless of FSM state.
    pub fn snapshot(&self, stamp: f64, frame_id: &str) -> TargetSnapshot {
        if !self.state.is_active() {
            return TargetSnapshot::not_tracking(stamp, frame_id.to_string());
        }
        let x = self.filter.state();
        TargetSnapshot {
            stamp,
            frame_id: frame_id.to_string(),
            tracking: true,
            id: self.tracked_id.clone().unwrap_or_default(),
            armors_num: self.tracked_armors_num,
            position: (
                x[crate::motion_model::XC],
                x[crate::motion_model::YC],
                x[crate::motion_model::ZA],
            ),
            velocity: (
                x[crate::motion_model::VXC],
                x[crate::motion_model::VYC],
                x[crate::motion_model::VZA],
            ),
            yaw: x[YAW],
            v_yaw: x[crate::motion_model::VYAW],
            radius_1: x[R],
            radius_2: self.another_r,
            dz: self.dz,
        }
    }
}
