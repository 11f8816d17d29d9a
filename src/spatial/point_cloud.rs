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

//! Seed point cloud steering space colonization.
//!
//! Points are bucketed into a uniform grid of [CellVec] cells. Removal only marks a point
//! unavailable, ids stay stable for the lifetime of the cloud.
use crate::coords::*;
use crate::iter::CellsInBoundsIter;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

/// Tolerance of the hemisphere removal.
pub const MIN_EPS: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct PointCloud {
    points: Vec<Point>,
    available: Vec<bool>,
    cell_size: f64,
    grid: HashMap<CellVec<3>, Vec<usize>>,
}

impl PointCloud {
    /// Builds the cloud with a cell size giving about one point per cell over the bounding box.
    pub fn new(points: Vec<Point>) -> Self {
        let cell_size = Self::auto_cell_size(&points);
        Self::with_cell_size(points, cell_size)
    }

    pub fn with_cell_size(points: Vec<Point>, cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0);
        let mut grid: HashMap<CellVec<3>, Vec<usize>> = HashMap::new();
        for (id, p) in points.iter().enumerate() {
            grid.entry(CellVec::from_float_coords(*p, cell_size))
                .or_default()
                .push(id);
        }
        Self {
            available: vec![true; points.len()],
            points,
            cell_size,
            grid,
        }
    }

    fn auto_cell_size(points: &[Point]) -> f64 {
        if points.len() < 2 {
            return 1.0;
        }
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for p in points {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        let extent = (0..3).map(|i| max[i] - min[i]).fold(0.0, f64::max);
        let size = extent / (points.len() as f64).cbrt();
        if size > 0.0 && size.is_finite() {
            size
        } else {
            1.0
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn point(&self, id: usize) -> Point {
        self.points[id]
    }

    #[inline]
    pub fn is_available(&self, id: usize) -> bool {
        self.available[id]
    }

    pub fn available_count(&self) -> usize {
        self.available.iter().filter(|a| **a).count()
    }

    pub fn available_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points
            .iter()
            .zip(&self.available)
            .filter_map(|(p, a)| a.then_some(*p))
    }

    pub fn removed_ids(&self) -> Vec<usize> {
        (0..self.len()).filter(|&id| !self.available[id]).collect()
    }

    /// Sorted ids of the available points within `radius` of `center`.
    pub fn ball_query(&self, center: Point, radius: f64) -> Vec<usize> {
        if !(radius >= 0.0) || self.is_empty() {
            return vec![];
        }
        let r2 = radius * radius;
        let inside = |id: &usize| {
            let v = sub(self.points[*id], center);
            self.available[*id] && dot(v, v) <= r2
        };

        let lo = CellVec::from_float_coords(sub(center, [radius; 3]), self.cell_size);
        let hi = CellVec::from_float_coords(add(center, [radius; 3]), self.cell_size);
        let mut ids: Vec<usize> = if CellsInBoundsIter::cell_count(lo, hi) > self.grid.len() {
            // the box covers more cells than are occupied, scan the buckets instead
            self.grid.values().flatten().copied().filter(inside).collect()
        } else {
            CellsInBoundsIter::new(lo, hi)
                .filter_map(|cell| self.grid.get(&cell))
                .flatten()
                .copied()
                .filter(inside)
                .collect()
        };
        ids.sort_unstable();
        ids
    }

    /// Points of the ball within a front cap and outside a back cap, both given as the
    /// half-angle around `direction`.
    pub fn partial_ball_query(
        &self,
        center: Point,
        radius: f64,
        direction: Point,
        front_angle: f64,
        back_angle: f64,
    ) -> Vec<usize> {
        let upper = radius * front_angle.cos();
        let lower = -radius * back_angle.cos();
        self.ball_query(center, radius)
            .into_iter()
            .filter(|&id| {
                let d = dot(sub(self.points[id], center), direction);
                lower < d && d < upper
            })
            .collect()
    }

    pub fn upper_half_ball_query(&self, center: Point, radius: f64, direction: Point) -> Vec<usize> {
        self.partial_ball_query(center, radius, direction, 0.0, FRAC_PI_2)
    }

    /// Closest available point within `radius`, lowest id on ties.
    pub fn nearest_neighbor(&self, point: Point, radius: f64) -> Option<usize> {
        self.ball_query(point, radius)
            .into_iter()
            .map(|id| (id, distance(point, self.points[id])))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Unit direction toward the nearest available point within `radius`.
    pub fn nearest_neighbor_direction(&self, point: Point, radius: f64) -> Option<Point> {
        let id = self.nearest_neighbor(point, radius)?;
        normalize(sub(self.points[id], point))
    }

    pub fn remove_ids(&mut self, ids: &[usize]) {
        for &id in ids {
            self.available[id] = false;
        }
    }

    /// Removes the points within `radius` of `point`, returns their ids.
    pub fn remove_points_around(&mut self, point: Point, radius: f64) -> Vec<usize> {
        let ids = self.ball_query(point, radius);
        self.remove_ids(&ids);
        ids
    }

    /// Removes the points within `radius` of `point` lying on the side of `direction`.
    pub fn remove_hemisphere(&mut self, point: Point, direction: Point, radius: f64) -> Vec<usize> {
        let ids: Vec<usize> = self
            .ball_query(point, radius)
            .into_iter()
            .filter(|&id| dot(sub(self.points[id], point), direction) > -MIN_EPS)
            .collect();
        self.remove_ids(&ids);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_cloud(n: usize) -> Vec<Point> {
        let mut rng = SmallRng::seed_from_u64(42);
        (0..n)
            .map(|_| std::array::from_fn(|_| rng.random_range(-10.0..10.0)))
            .collect()
    }

    #[test]
    fn ball_query_matches_brute_force() {
        let points = random_cloud(500);
        for cloud in [
            PointCloud::new(points.clone()),
            PointCloud::with_cell_size(points.clone(), 0.3),
            PointCloud::with_cell_size(points.clone(), 50.0),
        ] {
            for (center, radius) in [([0.0; 3], 3.0), ([5.0, -2.0, 1.0], 4.5), ([20.0; 3], 1.0)] {
                let expected: Vec<usize> = (0..points.len())
                    .filter(|&i| distance(points[i], center) <= radius)
                    .collect();
                assert_eq!(cloud.ball_query(center, radius), expected);
            }
        }
    }

    #[test]
    fn partial_ball() {
        let cloud = PointCloud::new(vec![
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.3, 0.5, 0.0],
            [0.9, 0.0, 0.0],
            [-0.2, 0.0, 0.5],
        ]);
        let up = cloud.upper_half_ball_query(ZERO, 1.5, [1.0, 0.0, 0.0]);
        assert_eq!(up, [0, 2, 3, 4]);
        // a front cap of 60 degrees keeps points below r/2 along the axis
        let part = cloud.partial_ball_query(ZERO, 1.0, [1.0, 0.0, 0.0], FRAC_PI_2 / 1.5, FRAC_PI_2);
        assert_eq!(part, [2, 3]);
        // a back cap of 60 degrees also keeps points down to -r/2
        let part = cloud.partial_ball_query(ZERO, 1.0, [1.0, 0.0, 0.0], FRAC_PI_2 / 1.5, FRAC_PI_2 / 1.5);
        assert_eq!(part, [2, 3, 5]);
    }

    #[test]
    fn removal_is_invalidation() {
        let mut cloud = PointCloud::new(vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        assert_eq!(cloud.nearest_neighbor(ZERO, 5.0), Some(0));
        assert_eq!(cloud.remove_hemisphere(ZERO, [1.0, 0.0, 0.0], 1.5), [0]);
        assert_eq!(cloud.nearest_neighbor(ZERO, 5.0), Some(1));
        assert_eq!(cloud.nearest_neighbor(ZERO, 0.5), None);
        assert!(allclose(
            cloud.nearest_neighbor_direction(ZERO, 5.0).unwrap(),
            [-1.0, 0.0, 0.0]
        ));
        assert_eq!(cloud.remove_points_around([0.0, 1.5, 0.0], 1.0), [2]);
        assert_eq!(cloud.removed_ids(), [0, 2]);
        assert_eq!(cloud.available_count(), 1);
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.point(0), [1.0, 0.0, 0.0]);
    }
}
