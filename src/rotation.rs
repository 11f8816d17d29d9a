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

//! Axis-angle rotations
use crate::coords::*;

pub const X_AXIS: Point = [1.0, 0.0, 0.0];
pub const Z_AXIS: Point = [0.0, 0.0, 1.0];

pub type Matrix = [[f64; 3]; 3];

/// Rodrigues rotation matrix `I + sin(a) K + (1 - cos(a)) K^2` around a unit axis.
pub fn rotation_around_axis(axis: Point, angle: f64) -> Matrix {
    let d = normalize(axis).unwrap_or(Z_AXIS);
    let (sn, cs) = angle.sin_cos();
    let k = [[0.0, -d[2], d[1]], [d[2], 0.0, -d[0]], [-d[1], d[0], 0.0]];
    let mut m = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let k2: f64 = (0..3).map(|l| k[i][l] * k[l][j]).sum();
            m[i][j] = if i == j { 1.0 } else { 0.0 } + sn * k[i][j] + (1.0 - cs) * k2;
        }
    }
    m
}

#[inline]
pub fn mat_vec(m: &Matrix, v: Point) -> Point {
    [dot(m[0], v), dot(m[1], v), dot(m[2], v)]
}

#[inline]
pub fn rotate_vector(v: Point, axis: Point, angle: f64) -> Point {
    mat_vec(&rotation_around_axis(axis, angle), v)
}

/// Rotation about z by `phi` followed by rotation about x by `theta`.
#[inline]
pub fn rotate_zx(v: Point, phi: f64, theta: f64) -> Point {
    rotate_vector(rotate_vector(v, Z_AXIS, phi), X_AXIS, theta)
}
