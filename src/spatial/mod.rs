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

//! Spatial data for growth steered by seed points and targets
pub mod context;
pub mod point_cloud;

pub use self::context::*;
pub use self::point_cloud::*;

use crate::coords::*;
use crate::util_funcs::{from_to_direction, in_same_halfspace, in_squared_proximity};

/// Stop criterion of [grow_to_target], in segment lengths.
pub const TARGET_PROXIMITY: f64 = 1.5;

/// Upper bound on the steps of [grow_to_target].
pub const MAX_TARGET_STEPS: usize = 10_000;

/// Points of `points` within `radius` of `center`, strictly in front of it along `direction`.
pub fn upper_half_ball(points: &[Point], center: Point, radius: f64, direction: Point) -> Vec<Point> {
    let r2 = radius * radius;
    points
        .iter()
        .copied()
        .filter(|p| {
            let v = sub(*p, center);
            dot(v, v) <= r2 && in_same_halfspace(v, direction)
        })
        .collect()
}

/// Steps from `start` toward `target`, each step blending the previous direction with the
/// target direction by `p`, until within `TARGET_PROXIMITY` segments of the target.
/// Returns the new points, `start` excluded, closed by `target` itself unless the walk
/// already ended on it.
pub fn grow_to_target(
    start: Point,
    start_direction: Point,
    target: Point,
    segment_length: f64,
    p: f64,
) -> Vec<Point> {
    let proximity = (TARGET_PROXIMITY * segment_length).powi(2);
    let mut points = vec![];
    let mut current = start;
    let mut direction = start_direction;
    for _ in 0..MAX_TARGET_STEPS {
        if in_squared_proximity(current, target, proximity) {
            break;
        }
        let (target_direction, _) = from_to_direction(current, target);
        let blended = combine(&[(1.0 - p, direction), (p, target_direction)]);
        direction = if allclose(blended, ZERO) {
            target_direction
        } else {
            normalize(blended).unwrap_or(target_direction)
        };
        current = add(current, scale(direction, segment_length));
        points.push(current);
    }
    if !allclose(current, target) {
        points.push(target);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_target() {
        let target = [10.0, 0.0, 0.0];
        let path = grow_to_target(ZERO, [0.0, 1.0, 0.0], target, 1.0, 0.5);
        assert_eq!(*path.last().unwrap(), target);
        let (walk, _) = path.split_at(path.len() - 1);
        assert!(distance(*walk.last().unwrap(), target) < 1.5);
        for w in walk.windows(2) {
            assert!((distance(w[0], w[1]) - 1.0).abs() < 1e-9);
        }
        // already close enough, only the target is added
        assert_eq!(
            grow_to_target(ZERO, [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1.0, 0.5),
            vec![[1.0, 0.0, 0.0]]
        );
        assert!(grow_to_target(ZERO, [1.0, 0.0, 0.0], ZERO, 1.0, 0.5).is_empty());
    }

    #[test]
    fn opposite_direction_turns_around() {
        let path = grow_to_target(ZERO, [-1.0, 0.0, 0.0], [5.0, 0.0, 0.0], 1.0, 0.5);
        assert_eq!(path[0], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn half_ball() {
        let pts = [[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [3.0, 0.0, 0.0]];
        assert_eq!(upper_half_ball(&pts, ZERO, 2.0, [1.0, 0.0, 0.0]), [[1.0, 0.0, 0.0]]);
    }
}
