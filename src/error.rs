//! Error types for the tracking core.

use thiserror::Error;

/// Errors raised by the [`crate::ekf::ExtendedKalmanFilter`] itself.
///
/// Kept separate from [`TrackError`] because the filter has no notion of
/// ticks, observations, or the FSM around it - it only knows about its own
/// linear algebra.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EkfError {
    /// The innovation covariance `S = H*P*H^T + R` was not invertible.
    /// The caller treats the measurement as rejected and rolls the filter
    /// back to the predicted state.
    #[error("innovation covariance is not invertible")]
    SingularInnovationCovariance,

    /// The posterior `x` or `P` produced by `update()` contained a NaN or
    /// infinite entry. The caller rolls back to the predicted state.
    #[error("filter posterior contains a non-finite entry")]
    NonFiniteState,
}

/// Errors raised by the tracking core's public surface.
///
/// All variants are local and non-fatal: a caller observing any of these
/// simply drops the tick (or treats the measurement as a miss) and keeps
/// running. The crate never panics and never aborts the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// The external frame-transform lookup failed for this tick. The whole
    /// tick is dropped; the tracker is left unchanged.
    #[error("frame transform failed: {reason}")]
    TransformFailure { reason: String },

    /// The EKF rejected a measurement because its innovation covariance was
    /// singular, or because the resulting state contained a non-finite
    /// value. Treated as a miss for FSM purposes.
    #[error("filter numerical failure: {0}")]
    FilterNumericalFailure(#[from] EkfError),

    /// The downstream ballistic solver raised anything. The facade emits
    /// the neutral gimbal command and continues.
    #[error("ballistic solver failed: {reason}")]
    SolverFailure { reason: String },

    /// An observation failed validation (`|z| > 2m`, or a non-finite
    /// position/yaw). Returned by [`crate::types::ArmorObservation::validate`];
    /// batch filtering treats it as a reason to drop the observation rather
    /// than surfacing it further.
    #[error("bad observation: {reason}")]
    BadObservation { reason: String },

    /// A tick's `dt` was not strictly positive (observations arrived
    /// out of order, or with a duplicate timestamp).
    #[error("non-monotonic tick: dt = {dt}")]
    NonMonotonicTick { dt: f64 },
}
