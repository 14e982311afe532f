//! End-to-end tick wiring: external transform -> [`Tracker`] -> solver.
//!
//! `spec.md` §2's data-flow diagram, assembled from the trait seams in
//! [`crate::solver`] plus a transform seam of the same shape. Grounded on
//! `mayara_core::locator`'s role of owning a collaborator behind a trait
//! and sequencing calls into the domain state machine each tick, adapted
//! from repeated polling to a one-shot `run_tick`.

use crate::error::TrackError;
use crate::solver::{BallisticSolver, SolverFacade};
use crate::tracker::Tracker;
use crate::types::{GimbalCommand, ObservationBatch, RawObservationBatch, TargetSnapshot};

/// Resolves a raw, untransformed observation batch into the fixed world
/// frame (`spec.md` §1, §5: "coordinate-frame transformation ... provided
/// by an external transform library"). No implementation ships with this
/// crate.
pub trait FrameTransformer {
    /// Transform `raw` into world-frame observations. A timeout or lookup
    /// failure is surfaced as [`TrackError::TransformFailure`]; the whole
    /// tick is then dropped without touching the tracker.
    fn transform(&self, raw: &RawObservationBatch) -> Result<ObservationBatch, TrackError>;
}

/// Owns a [`Tracker`] together with the two external collaborators it
/// needs each tick, and drives exactly one tick of `spec.md` §2's pipeline.
pub struct Pipeline<T, S> {
    transformer: T,
    tracker: Tracker,
    facade: SolverFacade<S>,
}

impl<T: FrameTransformer, S: BallisticSolver> Pipeline<T, S> {
    pub fn new(transformer: T, tracker: Tracker, solver: S) -> Self {
        Pipeline {
            transformer,
            tracker,
            facade: SolverFacade::new(solver),
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Run one tick: transform, step the tracker, publish.
    ///
    /// A transform failure or a non-monotonic tick (`spec.md` §5, §7)
    /// drops the tick: the tracker is left untouched and `Err` is
    /// returned. A solver failure never reaches the caller as an `Err` -
    /// it degrades to a neutral gimbal command, per `spec.md` §4.5.
    pub fn run_tick(
        &mut self,
        raw: &RawObservationBatch,
        now: f64,
    ) -> Result<(TargetSnapshot, GimbalCommand), TrackError> {
        let batch = self.transformer.transform(raw)?;
        self.tracker.step(&batch)?;
        Ok(self
            .facade
            .publish(&self.tracker, batch.header.stamp, &batch.header.frame_id, now))
    }
}
