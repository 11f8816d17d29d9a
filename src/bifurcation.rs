/* Persistence-driven synthesis of branching point trees.
Copyright (C) 2026  tmdtree contributors

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

//! Bifurcation geometry: two child directions from a parent direction and a bar's angles.
//!
//! Angles are `[phi0, theta0, phi1, theta1]`: the parent to first child rotation, then the
//! rotation between the two children. Each pair rotates about z by phi, then about x by theta.

use crate::coords::*;
use crate::rotation::rotate_zx;
use crate::util_funcs::get_random_point;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchingMethod {
    #[default]
    BioOriented,
    Symmetric,
    Directional,
    Random,
}

impl BranchingMethod {
    pub fn split<R: Rng + ?Sized>(self, direction: Point, angles: [f64; 4], rng: &mut R) -> (Point, Point) {
        match self {
            Self::BioOriented => bio_oriented(direction, angles),
            Self::Symmetric => symmetric(direction, angles),
            Self::Directional => directional(direction, angles),
            Self::Random => random(rng),
        }
    }

    /// Indices into a bar's angles that this method reads when splitting.
    pub fn angles_used(self) -> &'static [usize] {
        match self {
            Self::BioOriented => &[0, 1, 2, 3],
            Self::Symmetric | Self::Directional => &[2, 3],
            Self::Random => &[],
        }
    }
}

/// Children rotated by half the child-child angles, in opposite senses.
pub fn symmetric(direction: Point, angles: [f64; 4]) -> (Point, Point) {
    let phi1 = angles[2] / 2.0;
    let theta1 = angles[3] / 2.0;
    (
        rotate_zx(direction, phi1, theta1),
        rotate_zx(direction, -phi1, -theta1),
    )
}

/// First child offset from the parent, second child offset from the first.
pub fn bio_oriented(direction: Point, angles: [f64; 4]) -> (Point, Point) {
    let dir1 = rotate_zx(direction, angles[0], angles[1]);
    let dir2 = rotate_zx(dir1, angles[2], angles[3]);
    (dir1, dir2)
}

/// First child keeps the parent direction.
pub fn directional(direction: Point, angles: [f64; 4]) -> (Point, Point) {
    (direction, rotate_zx(direction, angles[2], angles[3]))
}

pub fn random<R: Rng + ?Sized>(rng: &mut R) -> (Point, Point) {
    let dir1 = get_random_point(rng);
    let dir2 = get_random_point(rng);
    (dir1, dir2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::f64::consts::FRAC_PI_2;

    const NAN: f64 = f64::NAN;

    #[test]
    fn directional_zero_delta() {
        let d = normalize([0.3, -0.2, 0.9]).unwrap();
        let (d1, d2) = directional(d, [NAN, NAN, 0.0, 0.0]);
        assert_eq!(d1, d);
        assert!(allclose(d1, d2));
    }

    #[test]
    fn directional_quarter_turn() {
        let (d1, d2) = directional([1.0, 0.0, 0.0], [0.0, 0.0, FRAC_PI_2, 0.0]);
        assert_eq!(d1, [1.0, 0.0, 0.0]);
        assert!(allclose(d2, [0.0, 1.0, 0.0]));
    }

    #[test]
    fn symmetric_is_mirrored() {
        let (d1, d2) = symmetric([1.0, 0.0, 0.0], [NAN, NAN, FRAC_PI_2, 0.0]);
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!(allclose(d1, [h, h, 0.0]));
        assert!(allclose(d2, [h, -h, 0.0]));
    }

    #[test]
    fn bio_oriented_composes() {
        let angles = [FRAC_PI_2, 0.0, FRAC_PI_2, 0.0];
        let (d1, d2) = bio_oriented([1.0, 0.0, 0.0], angles);
        assert!(allclose(d1, [0.0, 1.0, 0.0]));
        assert!(allclose(d2, [-1.0, 0.0, 0.0]));
    }

    #[test]
    fn random_ignores_angles() {
        let mut rng = SmallRng::seed_from_u64(42);
        let (d1, d2) = BranchingMethod::Random.split([1.0, 0.0, 0.0], [NAN; 4], &mut rng);
        assert!((norm(d1) - 1.0).abs() < 1e-9);
        assert!((norm(d2) - 1.0).abs() < 1e-9);
        assert_ne!(d1, d2);
    }

    #[test]
    fn serde_names() {
        let m: BranchingMethod = serde_json::from_str("\"bio_oriented\"").unwrap();
        assert_eq!(m, BranchingMethod::BioOriented);
    }
}
