/* Persistence-driven synthesis of branching point trees.
Copyright (C) 2023  Alexander Pyattaev
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

//! Small geometric helpers used by growers and splitting strategies

use crate::coords::*;
use rand::Rng;

/// Proximity tolerance, the float32 machine epsilon.
pub const EPS: f64 = f32::EPSILON as f64;

/// Uniformly distributed point on the unit sphere.
pub fn get_random_point<R: Rng + ?Sized>(rng: &mut R) -> Point {
    let phi = rng.random_range(0.0..std::f64::consts::TAU);
    let theta = rng.random_range(-1.0..1.0f64).acos();
    let sn_theta = theta.sin();
    [phi.cos() * sn_theta, phi.sin() * sn_theta, theta.cos()]
}

/// Unit direction from `from` to `to` and the distance between them.
#[inline]
pub fn from_to_direction(from: Point, to: Point) -> (Point, f64) {
    let v = sub(to, from);
    let length = norm(v);
    (scale(v, 1.0 / length), length)
}

/// True if `vector` points into the halfspace of `normal`.
#[inline]
pub fn in_same_halfspace(vector: Point, normal: Point) -> bool {
    dot(vector, normal) > EPS
}

#[inline]
pub fn in_squared_proximity(a: Point, b: Point, squared_proximity: f64) -> bool {
    let v = sub(b, a);
    dot(v, v) < squared_proximity + EPS
}

#[inline]
pub fn logit(x: f64) -> f64 {
    (x / (1.0 - x)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn random_points_are_unit() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1000 {
            let p = get_random_point(&mut rng);
            assert!((norm(p) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn geometry() {
        let (d, l) = from_to_direction([1.0, 0.0, 0.0], [1.0, 3.0, 0.0]);
        assert_eq!(d, [0.0, 1.0, 0.0]);
        assert_eq!(l, 3.0);
        assert!(in_same_halfspace([0.1, 1.0, 0.0], [0.0, 1.0, 0.0]));
        assert!(!in_same_halfspace([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]));
        assert!(in_squared_proximity(ZERO, [1.0, 1.0, 0.0], 2.0));
        assert!(!in_squared_proximity(ZERO, [1.0, 1.0, 0.0], 1.9));
        assert_eq!(logit(0.5), 0.0);
        assert_eq!(logit(0.0), f64::NEG_INFINITY);
    }
}
