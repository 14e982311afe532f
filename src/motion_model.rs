//! Concrete process/observation model for a rotating robot carrying armor
//! plates: the `f`, `h`, `Jf`, `Jh`, `Q(dt)`, `R(z)` and `P0` that
//! parameterize [`crate::ekf::ExtendedKalmanFilter`] for this tracking
//! problem.
//!
//! Grounded on the structure of `mayara_core::arpa::kalman::KalmanFilter`
//! (explicit state-transition/observation Jacobians built by hand each
//! step) generalized to the 9-state/4-measurement nonlinear case `spec.md`
//! §4.2 describes.

use std::cell::Cell;
use std::rc::Rc;

use nalgebra::{SMatrix, SVector};

use crate::config::EkfConfig;
use crate::ekf::ExtendedKalmanFilter;

/// State vector layout (`spec.md` §3).
pub const XC: usize = 0;
pub const VXC: usize = 1;
pub const YC: usize = 2;
pub const VYC: usize = 3;
pub const ZA: usize = 4;
pub const VZA: usize = 5;
pub const YAW: usize = 6;
pub const VYAW: usize = 7;
pub const R: usize = 8;

/// Number of filter states.
pub const NX: usize = 9;
/// Number of measurement dimensions: `(xa, ya, za, yaw)`.
pub const NZ: usize = 4;

pub type RobotState = SVector<f64, NX>;
pub type RobotMeasurement = SVector<f64, NZ>;

/// Lower/upper clamp for the radius state, enforced by the tracker after
/// every update (`spec.md` §4.4 post-conditions).
pub const R_MIN: f64 = 0.12;
pub const R_MAX: f64 = 0.40;

/// Initial radius assigned on track initialization.
pub const R_INIT: f64 = 0.26;

/// Builds the concrete hooks for the 9-state robot tracking problem and
/// hands back a ready-to-use filter together with the shared `dt` cell the
/// tracker must update before each `predict()`.
pub struct RobotMotionModel;

impl RobotMotionModel {
    /// Construct the filter and its `dt` handle from noise configuration.
    pub fn build(config: &EkfConfig) -> (ExtendedKalmanFilter<NX, NZ>, Rc<Cell<f64>>) {
        let dt_cell = Rc::new(Cell::new(0.0));

        let f = {
            let dt_cell = Rc::clone(&dt_cell);
            move |x: &RobotState| -> RobotState {
                let dt = dt_cell.get();
                let mut x2 = *x;
                x2[XC] += x[VXC] * dt;
                x2[YC] += x[VYC] * dt;
                x2[ZA] += x[VZA] * dt;
                x2[YAW] += x[VYAW] * dt;
                // r: random walk, unchanged by f.
                x2
            }
        };

        let jf = {
            let dt_cell = Rc::clone(&dt_cell);
            move |_x: &RobotState| -> SMatrix<f64, NX, NX> {
                let dt = dt_cell.get();
                let mut m = SMatrix::<f64, NX, NX>::identity();
                m[(XC, VXC)] = dt;
                m[(YC, VYC)] = dt;
                m[(ZA, VZA)] = dt;
                m[(YAW, VYAW)] = dt;
                m
            }
        };

        let h = |x: &RobotState| -> RobotMeasurement {
            let r = x[R];
            let yaw = x[YAW];
            SVector::<f64, NZ>::new(
                x[XC] - r * yaw.cos(),
                x[YC] - r * yaw.sin(),
                x[ZA],
                yaw,
            )
        };

        let jh = |x: &RobotState| -> SMatrix<f64, NZ, NX> {
            let r = x[R];
            let yaw = x[YAW];
            let mut m = SMatrix::<f64, NZ, NX>::zeros();
            // xa = xc - r*cos(yaw)
            m[(0, XC)] = 1.0;
            m[(0, YAW)] = r * yaw.sin();
            m[(0, R)] = -yaw.cos();
            // ya = yc - r*sin(yaw)
            m[(1, YC)] = 1.0;
            m[(1, YAW)] = -r * yaw.cos();
            m[(1, R)] = -yaw.sin();
            // za_obs = za
            m[(2, ZA)] = 1.0;
            // yaw_obs = yaw
            m[(3, YAW)] = 1.0;
            m
        };

        let q = {
            let dt_cell = Rc::clone(&dt_cell);
            let config = *config;
            move || -> SMatrix<f64, NX, NX> {
                let dt = dt_cell.get();
                let mut m = SMatrix::<f64, NX, NX>::zeros();
                let pair = |m: &mut SMatrix<f64, NX, NX>, p: usize, v: usize, sigma2: f64| {
                    m[(p, p)] = dt.powi(4) / 4.0 * sigma2;
                    m[(p, v)] = dt.powi(3) / 2.0 * sigma2;
                    m[(v, p)] = dt.powi(3) / 2.0 * sigma2;
                    m[(v, v)] = dt.powi(2) * sigma2;
                };
                pair(&mut m, XC, VXC, config.sigma2_q_x);
                pair(&mut m, YC, VYC, config.sigma2_q_y);
                pair(&mut m, ZA, VZA, config.sigma2_q_z);
                pair(&mut m, YAW, VYAW, config.sigma2_q_yaw);
                m[(R, R)] = dt.powi(4) / 4.0 * config.sigma2_q_r;
                m
            }
        };

        let r_provider = {
            let config = *config;
            move |z: &RobotMeasurement| -> SMatrix<f64, NZ, NZ> {
                SMatrix::<f64, NZ, NZ>::from_diagonal(&SVector::<f64, NZ>::new(
                    (config.r_x * z[0]).abs(),
                    (config.r_y * z[1]).abs(),
                    (config.r_z * z[2]).abs(),
                    config.r_yaw,
                ))
            }
        };

        let p0 = SMatrix::<f64, NX, NX>::identity();

        (
            ExtendedKalmanFilter::new(f, h, jf, jh, q, r_provider, p0),
            dt_cell,
        )
    }

    /// Build the initial state vector for a freshly-initialized track.
    pub fn initial_state(x: f64, y: f64, z: f64, yaw: f64) -> RobotState {
        SVector::<f64, NX>::new(x, 0.0, y, 0.0, z, 0.0, yaw, 0.0, R_INIT)
    }

    /// `(xa, ya, za, yaw)` expected observation of the currently-tracked
    /// plate (`i = 0`) for the given state.
    pub fn expected_plate0(x: &RobotState) -> RobotMeasurement {
        let r = x[R];
        let yaw = x[YAW];
        SVector::<f64, NZ>::new(x[XC] - r * yaw.cos(), x[YC] - r * yaw.sin(), x[ZA], yaw)
    }
}
