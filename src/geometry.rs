//! Derives the expected world positions of every armor plate on the
//! tracked robot from the current filter state, and matches an
//! observation against them.
//!
//! Grounded on `mayara_core::arpa::polar::PolarConverter`'s pattern of a
//! small pure-function converter struct with no mutable state, adapted
//! from polar/local coordinate conversion to the multi-plate geometry
//! `spec.md` §4.3 describes.

use std::f64::consts::PI;

use crate::motion_model::RobotState;
use crate::motion_model::{R, XC, YAW, YC, ZA};

/// A point in the world frame.
pub type Point3 = (f64, f64, f64);

/// Robot-type -> armor-count lookup (`spec.md` §4.3). Defaults to 4 when
/// the id is not recognized.
pub fn robot_type_table(numeric_id: &str) -> u8 {
    match numeric_id {
        "1" => 2,      // hero: opposing front/back plates
        "outpost" => 3, // outpost: three plates at 120 degrees
        "2" | "3" | "4" | "5" | "7" | "guard" | "base" => 4,
        _ => 4,
    }
}

/// Pure function over filter state plus the track-wide auxiliary geometry
/// (`another_r`, `dz`) that the FSM owns outside the filter.
#[derive(Debug, Clone, Copy)]
pub struct ArmorGeometry {
    pub armors_num: u8,
    pub another_r: f64,
    pub dz: f64,
}

impl ArmorGeometry {
    pub fn new(armors_num: u8, another_r: f64, dz: f64) -> Self {
        ArmorGeometry {
            armors_num,
            another_r,
            dz,
        }
    }

    /// Predicted `(index, position, plate_yaw)` for every plate on the
    /// robot, given the current filter state.
    pub fn predicted_plates(&self, x: &RobotState) -> Vec<(usize, Point3, f64)> {
        let xc = x[XC];
        let yc = x[YC];
        let za = x[ZA];
        let yaw = x[YAW];
        let r = x[R];
        let n = self.armors_num.max(1) as usize;

        (0..n)
            .map(|i| {
                let plate_yaw = yaw + i as f64 * 2.0 * PI / n as f64;
                let (ri, zi) = if n == 4 && i % 2 == 1 {
                    (self.another_r, za + self.dz)
                } else {
                    (r, za)
                };
                let pos = (
                    xc - ri * plate_yaw.cos(),
                    yc - ri * plate_yaw.sin(),
                    zi,
                );
                (i, pos, normalize_angle(plate_yaw))
            })
            .collect()
    }

    /// Index and yaw of the predicted plate closest (Euclidean) to
    /// `observed`, together with the distance achieved.
    pub fn best_match(&self, x: &RobotState, observed: Point3) -> (usize, f64, f64) {
        let plates = self.predicted_plates(x);
        plates
            .into_iter()
            .map(|(i, pos, plate_yaw)| (i, euclidean(pos, observed), plate_yaw))
            .min_by(|a, b| a.1.partial_cmp(&b.1).expect("distances are finite"))
            .expect("armors_num is at least 1")
    }
}

fn euclidean(a: Point3, b: Point3) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    let dz = a.2 - b.2;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Normalizes an angle to the principal branch `(-pi, pi]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Unwraps `yaw` so it lies within `pi` of `reference` (`spec.md` §4.4).
pub fn unwrap_yaw(yaw: f64, reference: f64) -> f64 {
    let mut y = yaw;
    while y - reference > PI {
        y -= 2.0 * PI;
    }
    while y - reference <= -PI {
        y += 2.0 * PI;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::SVector;

    fn state(xc: f64, yc: f64, za: f64, yaw: f64, r: f64) -> RobotState {
        SVector::<f64, 9>::new(xc, 0.0, yc, 0.0, za, 0.0, yaw, 0.0, r)
    }

    #[test]
    fn robot_type_table_defaults_to_four() {
        assert_eq!(robot_type_table("1"), 2);
        assert_eq!(robot_type_table("outpost"), 3);
        assert_eq!(robot_type_table("unknown_thing"), 4);
    }

    #[test]
    fn two_plate_geometry_is_opposed() {
        let geom = ArmorGeometry::new(2, 0.26, 0.0);
        let x = state(0.0, 0.0, 0.0, 0.0, 0.2);
        let plates = geom.predicted_plates(&x);
        assert_eq!(plates.len(), 2);
        // plate 0 at yaw=0: (-r, 0, 0); plate 1 at yaw=pi: (r, 0, 0)
        assert_abs_diff_eq!(plates[0].1 .0, -0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(plates[1].1 .0, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn four_plate_geometry_alternates_radius_and_height() {
        let geom = ArmorGeometry::new(4, 0.27, 0.05);
        let x = state(0.0, 0.0, 0.1, 0.0, 0.25);
        let plates = geom.predicted_plates(&x);
        assert_abs_diff_eq!(plates[0].1 .2, 0.1, epsilon = 1e-9); // even: za
        assert_abs_diff_eq!(plates[1].1 .2, 0.15, epsilon = 1e-9); // odd: za+dz
        assert_abs_diff_eq!(plates[2].1 .2, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn best_match_finds_closest_plate() {
        let geom = ArmorGeometry::new(4, 0.27, 0.0);
        let x = state(0.0, 0.0, 0.0, 0.0, 0.25);
        // plate 1 sits at yaw = pi/2: (0, -0.27, 0)
        let (idx, dist, _) = geom.best_match(&x, (0.0, -0.27, 0.0));
        assert_eq!(idx, 1);
        assert!(dist < 1e-6);
    }

    #[test]
    fn unwrap_yaw_handles_wraparound() {
        let unwrapped = unwrap_yaw(-3.10, 3.10);
        assert_abs_diff_eq!(unwrapped, 2.0 * PI - 3.10, epsilon = 1e-9);
    }

    #[test]
    fn normalize_angle_stays_in_principal_branch() {
        assert_abs_diff_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-9);
        assert_abs_diff_eq!(normalize_angle(-3.0 * PI), PI, epsilon = 1e-9);
    }
}
