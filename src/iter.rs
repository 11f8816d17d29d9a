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

//! Iterators over grown forests and over grid cells
use crate::coords::*;
use crate::section::{Section, SectionId};
use crate::tree::Forest;

/// iterator over all cells inside given bounds (both inclusive), last axis fastest
pub struct CellsInBoundsIter<const N: usize> {
    // next cell to return
    current: Option<CellVec<N>>,

    // lowest corner of the bound
    bound_min: CellVec<N>,

    // highest corner of the bound
    bound_max: CellVec<N>,
}

impl<const N: usize> CellsInBoundsIter<N> {
    pub fn new(bound_min: CellVec<N>, bound_max: CellVec<N>) -> Self {
        let empty = bound_min.pos.iter().zip(bound_max.pos).any(|(lo, hi)| *lo > hi);
        Self {
            current: if empty { None } else { Some(bound_min) },
            bound_min,
            bound_max,
        }
    }

    /// Number of cells in the bounds, saturating.
    pub fn cell_count(bound_min: CellVec<N>, bound_max: CellVec<N>) -> usize {
        bound_min
            .pos
            .iter()
            .zip(bound_max.pos)
            .map(|(lo, hi)| (hi as i64 - *lo as i64 + 1).max(0) as usize)
            .fold(1usize, |acc, n| acc.saturating_mul(n))
    }
}

impl<const N: usize> Iterator for CellsInBoundsIter<N> {
    type Item = CellVec<N>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        // advance like an odometer
        let mut next = current;
        let mut axis = N;
        self.current = loop {
            if axis == 0 {
                break None;
            }
            axis -= 1;
            if next.pos[axis] < self.bound_max.pos[axis] {
                next.pos[axis] += 1;
                break Some(next);
            }
            next.pos[axis] = self.bound_min.pos[axis];
        };
        debug_assert!(current.is_inside_bounds(self.bound_min, self.bound_max));
        Some(current)
    }
}

/// Depth-first pre-order traversal of a forest, roots in commit order, first child first.
pub struct ForestIter<'a> {
    /// the forest being walked
    forest: &'a Forest,

    /// sections still to visit, next on top
    stack: Vec<SectionId>,
}

impl<'a> ForestIter<'a> {
    pub fn new(forest: &'a Forest) -> Self {
        let mut stack: Vec<SectionId> = forest.roots().collect();
        stack.reverse();
        Self { forest, stack }
    }

    /// Walk only the subtree below `root`, `root` included.
    pub fn from_section(forest: &'a Forest, root: SectionId) -> Self {
        Self {
            forest,
            stack: vec![root],
        }
    }
}

impl<'a> Iterator for ForestIter<'a> {
    type Item = (SectionId, &'a Section);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.forest.children_of(current).iter().rev().copied());
        Some((current, &self.forest[current]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{Process, Stop};

    #[test]
    fn cells_in_bounds() {
        let min = CellVec::new([-1, 0, 2]);
        let max = CellVec::new([0, 1, 3]);
        let cells: Vec<_> = CellsInBoundsIter::new(min, max).collect();
        assert_eq!(cells.len(), 8);
        assert_eq!(CellsInBoundsIter::cell_count(min, max), 8);
        assert_eq!(cells[0], min);
        assert_eq!(cells[1], CellVec::new([-1, 0, 3]));
        assert_eq!(*cells.last().unwrap(), max);
        for (i, a) in cells.iter().enumerate() {
            assert!(a.is_inside_bounds(min, max));
            assert!(!cells[i + 1..].contains(a));
        }
    }

    #[test]
    fn empty_bounds() {
        let min = CellVec::new([1, 0, 0]);
        let max = CellVec::new([0, 0, 0]);
        assert_eq!(CellsInBoundsIter::new(min, max).count(), 0);
        assert_eq!(CellsInBoundsIter::cell_count(min, max), 0);
        assert_eq!(CellsInBoundsIter::new(max, max).count(), 1);
    }

    fn section(parent: Option<SectionId>) -> Section {
        Section {
            parent,
            points: vec![ZERO],
            process: Process::Secondary,
            pathlength: 0.0,
            stop: Stop::Segments(2),
        }
    }

    #[test]
    fn depth_first_order() {
        // 0 -> (1 -> (3, 4), 2), plus a second root 5
        let mut forest = Forest::default();
        forest.push(section(None));
        forest.push(section(Some(0)));
        forest.push(section(Some(0)));
        forest.push(section(Some(1)));
        forest.push(section(Some(1)));
        forest.push(section(None));
        let order: Vec<SectionId> = ForestIter::new(&forest).map(|(id, _)| id).collect();
        assert_eq!(order, [0, 1, 3, 4, 2, 5]);
        let order: Vec<SectionId> = ForestIter::from_section(&forest, 1).map(|(id, _)| id).collect();
        assert_eq!(order, [1, 3, 4]);
    }
}
