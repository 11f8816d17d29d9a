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

//! Contains the 3D point type with its vector math, and CellVec for integer grid cells.

/// A point or a direction in 3D space.
pub type Point = [f64; 3];

/// The origin, also used as the "no direction" value.
pub const ZERO: Point = [0.0; 3];

duplicate::duplicate! {
    [
        name    op;
        [add]   [+];
        [sub]   [-];
    ]
    /// Component-wise arithmetic on two points.
    #[inline]
    pub fn name(a: Point, b: Point) -> Point {
        [a[0] op b[0], a[1] op b[1], a[2] op b[2]]
    }
}

#[inline]
pub fn scale(a: Point, s: f64) -> Point {
    a.map(|e| e * s)
}

#[inline]
pub fn dot(a: Point, b: Point) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn norm(a: Point) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    norm(sub(b, a))
}

/// Weighted sum of directions, the building block of every direction proposal.
#[inline]
pub fn combine(terms: &[(f64, Point)]) -> Point {
    terms
        .iter()
        .fold(ZERO, |acc, (w, v)| add(acc, scale(*v, *w)))
}

/// Unit vector along `a`, None if `a` is too short to have a direction.
#[inline]
pub fn normalize(a: Point) -> Option<Point> {
    let n = norm(a);
    if n > f64::EPSILON && n.is_finite() {
        Some(scale(a, 1.0 / n))
    } else {
        None
    }
}

/// Same tolerance as numpy's allclose with default arguments.
#[inline]
pub fn allclose(a: Point, b: Point) -> bool {
    a.iter()
        .zip(b)
        .all(|(x, y)| (x - y).abs() <= 1e-8 + 1e-5 * y.abs())
}

/// Integer coordinates of a cell in a uniform grid over space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, std::hash::Hash)]
pub struct CellVec<const N: usize = 3> {
    pub pos: [i32; N],
}

impl<const N: usize> CellVec<N> {
    #[inline]
    pub fn new(pos: [i32; N]) -> Self {
        Self { pos }
    }

    /// creates a cell from floating point coords.
    /// # Args
    /// * `pos` the position in space
    /// * `cell_size` edge length of a grid cell, must be positive
    #[inline]
    pub fn from_float_coords(pos: [f64; N], cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0);
        Self {
            pos: pos.map(|e| (e / cell_size).floor() as i32),
        }
    }

    /// check if this cell is inside of a bounding box
    /// where min is the lowest corner of the box, and max is the highest corner (both inclusive)
    #[inline]
    pub fn is_inside_bounds(self, min: Self, max: Self) -> bool {
        self.pos
            .iter()
            .zip(min.pos.iter().zip(max.pos.iter()))
            .all(|(s, (lo, hi))| s >= lo && s <= hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn sizes() {
        assert_eq!(12, size_of::<CellVec<3>>());
        assert_eq!(8, size_of::<CellVec<2>>());
    }

    #[test]
    fn vector_math() {
        let a = [1.0, 2.0, 2.0];
        assert_eq!(norm(a), 3.0);
        assert_eq!(sub(add(a, a), a), a);
        assert_eq!(dot(a, [1.0, 0.0, 0.0]), 1.0);
        let n = normalize(a).unwrap();
        assert!((norm(n) - 1.0).abs() < 1e-12);
        assert!(normalize(ZERO).is_none());
        assert_eq!(combine(&[(0.5, a), (0.5, a)]), a);
    }

    #[test]
    fn cells() {
        let c = CellVec::from_float_coords([0.5, -0.5, 10.0], 1.0);
        assert_eq!(c.pos, [0, -1, 10]);
        assert!(c.is_inside_bounds(CellVec::new([0, -2, 9]), CellVec::new([1, -1, 10])));
        assert!(!c.is_inside_bounds(CellVec::new([1, -2, 9]), CellVec::new([2, 0, 11])));
        assert_eq!(CellVec::from_float_coords([-0.1, 0.0, 7.9], 4.0).pos, [-1, 0, 1]);
    }
}
