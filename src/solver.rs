//! Adapter exposing the tracked state to an external ballistic solver.
//!
//! The solver itself is out of scope (`spec.md` §1) - only its input
//! contract is specified. Grounded on `mayara_core::io::IoProvider`'s
//! pattern of a small trait abstracting a collaborator the crate never
//! implements, paired with a facade that owns the policy around calling it
//! (here: publish only while tracking, neutral command on any failure).

use crate::error::TrackError;
use crate::tracker::Tracker;
use crate::types::{GimbalCommand, TargetSnapshot};

/// The downstream ballistic solver's input/output contract (`spec.md`
/// §4.5). No implementation ships with this crate; callers wire in
/// whatever solver they have.
pub trait BallisticSolver {
    /// Solve `target` (as of `now`) into a gimbal aim command. Any error
    /// is treated as solver failure by [`SolverFacade`]: it is not
    /// propagated to the tracker.
    fn solve(&self, target: &TargetSnapshot, now: f64) -> Result<GimbalCommand, TrackError>;
}

/// Thin adapter that turns a [`Tracker`]'s state into a published
/// [`TargetSnapshot`] and, via a [`BallisticSolver`], a [`GimbalCommand`].
///
/// Holds no state of its own beyond the solver it wraps; all tracking
/// state lives in the [`Tracker`] it is handed each tick.
pub struct SolverFacade<S> {
    solver: S,
}

impl<S: BallisticSolver> SolverFacade<S> {
    pub fn new(solver: S) -> Self {
        SolverFacade { solver }
    }

    /// Publish this tick's snapshot and gimbal command for `tracker`.
    ///
    /// While `tracker.state()` is TRACKING or TEMP_LOST, the snapshot is
    /// built from the filter's posterior and handed to the solver; any
    /// solver failure degrades to [`GimbalCommand::NEUTRAL`] without
    /// surfacing an error to the caller. Otherwise the snapshot reports
    /// `tracking = false` and the command is neutral, without calling the
    /// solver at all.
    pub fn publish(
        &self,
        tracker: &Tracker,
        stamp: f64,
        frame_id: &str,
        now: f64,
    ) -> (TargetSnapshot, GimbalCommand) {
        let snapshot = tracker.snapshot(stamp, frame_id);

        if !tracker.state().is_active() {
            return (snapshot, GimbalCommand::NEUTRAL);
        }

        let command = match self.solver.solve(&snapshot, now) {
            Ok(cmd) => cmd,
            Err(err) => {
                log::warn!("ballistic solver failed: {err}");
                GimbalCommand::NEUTRAL
            }
        };
        (snapshot, command)
    }
}
