//! Generic discrete extended Kalman filter.
//!
//! Parameterized once at construction with function-valued hooks rather
//! than fixed matrices, the way `spec.md` §9 asks for it: a process model
//! `f`, an observation model `h`, their Jacobians, and noise-covariance
//! providers. The filter itself knows nothing about robots or armor
//! plates - [`crate::motion_model::RobotMotionModel`] is what fills the
//! hooks in for this domain.
//!
//! Grounded on `mayara_core::arpa::kalman::KalmanFilter`'s predict/update
//! split (separate `predict()` and `update_covariance()` steps, matrices
//! held as struct fields) generalized from its fixed 4-state radar model to
//! an arbitrary const-generic state/measurement size via `nalgebra`.

use nalgebra::{SMatrix, SVector};

use crate::error::EkfError;

type Vec_<const N: usize> = SVector<f64, N>;
type Mat_<const R: usize, const C: usize> = SMatrix<f64, R, C>;

/// A discrete nonlinear Kalman filter over an `NX`-dimensional state and an
/// `NZ`-dimensional measurement.
pub struct ExtendedKalmanFilter<const NX: usize, const NZ: usize> {
    f: Box<dyn Fn(&Vec_<NX>) -> Vec_<NX>>,
    h: Box<dyn Fn(&Vec_<NX>) -> Vec_<NZ>>,
    jf: Box<dyn Fn(&Vec_<NX>) -> Mat_<NX, NX>>,
    jh: Box<dyn Fn(&Vec_<NX>) -> Mat_<NZ, NX>>,
    q: Box<dyn Fn() -> Mat_<NX, NX>>,
    r: Box<dyn Fn(&Vec_<NZ>) -> Mat_<NZ, NZ>>,
    p0: Mat_<NX, NX>,

    x: Vec_<NX>,
    p: Mat_<NX, NX>,
    x_pred: Vec_<NX>,
    p_pred: Mat_<NX, NX>,
}

impl<const NX: usize, const NZ: usize> ExtendedKalmanFilter<NX, NZ> {
    /// Construct a filter from its five hooks and initial covariance.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        f: impl Fn(&Vec_<NX>) -> Vec_<NX> + 'static,
        h: impl Fn(&Vec_<NX>) -> Vec_<NZ> + 'static,
        jf: impl Fn(&Vec_<NX>) -> Mat_<NX, NX> + 'static,
        jh: impl Fn(&Vec_<NX>) -> Mat_<NZ, NX> + 'static,
        q: impl Fn() -> Mat_<NX, NX> + 'static,
        r: impl Fn(&Vec_<NZ>) -> Mat_<NZ, NZ> + 'static,
        p0: Mat_<NX, NX>,
    ) -> Self {
        ExtendedKalmanFilter {
            f: Box::new(f),
            h: Box::new(h),
            jf: Box::new(jf),
            jh: Box::new(jh),
            q: Box::new(q),
            r: Box::new(r),
            p0,
            x: Vec_::<NX>::zeros(),
            p: p0,
            x_pred: Vec_::<NX>::zeros(),
            p_pred: p0,
        }
    }

    /// Assign the posterior state and reset covariance to `P0`.
    pub fn set_state(&mut self, x: Vec_<NX>) {
        self.x = x;
        self.p = self.p0;
        self.x_pred = x;
        self.p_pred = self.p0;
    }

    /// Current posterior state.
    pub fn state(&self) -> &Vec_<NX> {
        &self.x
    }

    /// Most recent prediction. Valid for reading (association) between a
    /// `predict()` call and the matching `update()`.
    pub fn predicted_state(&self) -> &Vec_<NX> {
        &self.x_pred
    }

    /// Overwrites the predicted state in place, without touching
    /// `P_pred`. Used by callers that need to resolve a discontinuity
    /// (e.g. an armor-plate handover) between `predict()` and `update()`.
    pub fn set_predicted_state(&mut self, x_pred: Vec_<NX>) {
        self.x_pred = x_pred;
    }

    /// Overwrites the posterior state in place, without touching `P`.
    /// Used by callers applying a hard constraint (e.g. clamping a state
    /// component) after `update()`.
    pub fn set_posterior_state(&mut self, x: Vec_<NX>) {
        self.x = x;
    }

    /// Commits the last prediction as the new posterior, for ticks with
    /// no accepted measurement (pure prediction propagation).
    pub fn commit_prediction(&mut self) {
        self.x = self.x_pred;
        self.p = self.p_pred;
    }

    /// Current posterior covariance.
    pub fn covariance(&self) -> &Mat_<NX, NX> {
        &self.p
    }

    /// `x_pred = f(x); P_pred = F*P*F^T + Q`, `F = Jf(x)`.
    pub fn predict(&mut self) -> &Vec_<NX> {
        let f_jac = (self.jf)(&self.x);
        self.x_pred = (self.f)(&self.x);
        self.p_pred = f_jac * self.p * f_jac.transpose() + (self.q)();
        &self.x_pred
    }

    /// `H = Jh(x_pred); K = P_pred*H^T*(H*P_pred*H^T + R(z))^-1;`
    /// `x_post = x_pred + K*(z - h(x_pred)); P_post = (I - K*H)*P_pred`.
    ///
    /// On a singular innovation covariance the filter rolls back to the
    /// predicted state (`x_post = x_pred`, `P_post = P_pred`) and returns
    /// an error; the caller treats the measurement as rejected.
    pub fn update(&mut self, z: &Vec_<NZ>) -> Result<&Vec_<NX>, EkfError> {
        let h_jac = (self.jh)(&self.x_pred);
        let innovation = z - (self.h)(&self.x_pred);
        let s = h_jac * self.p_pred * h_jac.transpose() + (self.r)(z);

        let s_inv = match s.try_inverse() {
            Some(inv) => inv,
            None => {
                self.x = self.x_pred;
                self.p = self.p_pred;
                return Err(EkfError::SingularInnovationCovariance);
            }
        };

        let k = self.p_pred * h_jac.transpose() * s_inv;
        let x_post = self.x_pred + k * innovation;
        let identity = Mat_::<NX, NX>::identity();
        let p_post = (identity - k * h_jac) * self.p_pred;

        if !x_post.iter().all(|v| v.is_finite()) || !p_post.iter().all(|v| v.is_finite()) {
            self.x = self.x_pred;
            self.p = self.p_pred;
            return Err(EkfError::NonFiniteState);
        }

        self.x = x_post;
        self.p = p_post;

        Ok(&self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{matrix, vector};

    /// A trivial 1D constant-position filter: f = identity, h = identity.
    fn unit_filter() -> ExtendedKalmanFilter<1, 1> {
        ExtendedKalmanFilter::new(
            |x: &Vec_<1>| *x,
            |x: &Vec_<1>| *x,
            |_: &Vec_<1>| matrix![1.0],
            |_: &Vec_<1>| matrix![1.0],
            || matrix![0.01],
            |_: &Vec_<1>| matrix![0.1],
            matrix![1.0],
        )
    }

    #[test]
    fn predict_then_update_converges_to_measurement() {
        let mut kf = unit_filter();
        kf.set_state(vector![0.0]);

        for _ in 0..50 {
            kf.predict();
            kf.update(&vector![5.0]).unwrap();
        }

        assert_abs_diff_eq!(kf.state()[0], 5.0, epsilon = 1e-2);
    }

    #[test]
    fn singular_innovation_rolls_back_to_prediction() {
        let mut kf = ExtendedKalmanFilter::new(
            |x: &Vec_<1>| *x,
            |x: &Vec_<1>| *x,
            |_: &Vec_<1>| matrix![1.0],
            |_: &Vec_<1>| matrix![0.0], // H = 0 makes S = R = 0, singular
            || matrix![0.01],
            |_: &Vec_<1>| matrix![0.0],
            matrix![1.0],
        );
        kf.set_state(vector![2.0]);
        kf.predict();
        let err = kf.update(&vector![9.0]).unwrap_err();
        assert_eq!(err, EkfError::SingularInnovationCovariance);
        assert_abs_diff_eq!(kf.state()[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn non_finite_posterior_rolls_back_to_prediction() {
        let mut kf = ExtendedKalmanFilter::new(
            |x: &Vec_<1>| *x,
            |_: &Vec_<1>| vector![f64::NAN], // h() returns NaN -> innovation is NaN
            |_: &Vec_<1>| matrix![1.0],
            |_: &Vec_<1>| matrix![1.0],
            || matrix![0.01],
            |_: &Vec_<1>| matrix![0.1],
            matrix![1.0],
        );
        kf.set_state(vector![2.0]);
        kf.predict();
        let err = kf.update(&vector![9.0]).unwrap_err();
        assert_eq!(err, EkfError::NonFiniteState);
        assert_abs_diff_eq!(kf.state()[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn predicted_state_is_readable_before_commit() {
        let mut kf = unit_filter();
        kf.set_state(vector![3.0]);
        kf.predict();
        assert_abs_diff_eq!(kf.predicted_state()[0], 3.0, epsilon = 1e-12);
    }
}
