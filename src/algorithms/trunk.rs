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

//! Fixed length trunks without a barcode
use crate::bifurcation::BranchingMethod;
use crate::error::Result;
use crate::sample::Distribution;
use crate::section::*;
use crate::spatial::SpaceColonizationContext;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrunkAlgo {
    num_seg: usize,
}

impl TrunkAlgo {
    pub fn new(num_seg: usize) -> Self {
        Self { num_seg }
    }

    /// Shortest trunk: the mandatory first step and one checked step, three points.
    pub fn axon() -> Self {
        Self::new(1)
    }

    pub fn num_seg(&self) -> usize {
        self.num_seg
    }

    pub fn initialize(&self) -> (Stop, usize) {
        (Stop::Segments(self.num_seg), 1)
    }

    /// Random child directions, both children reuse the parent stop.
    pub fn bifurcate<R: Rng + ?Sized>(&self, section: &SectionGrower, rng: &mut R) -> [SectionData; 2] {
        let (dir1, dir2) = BranchingMethod::Random.split(section.direction, [f64::NAN; 4], rng);
        let first_point = section.last_point();
        [dir1, dir2].map(|direction| SectionData {
            direction,
            first_point,
            stop: section.stop,
            process: section.process,
            target: section.target,
        })
    }

    pub fn extend<R: Rng + ?Sized>(
        &self,
        section: &mut SectionGrower,
        step: &Distribution,
        ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<SectionState> {
        section.next(step, ctx, rng)
    }
}
