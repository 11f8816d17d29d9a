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

//! Growth algorithms, one per [GrowthMethod]
pub mod space_colonization;
pub mod tmd;
pub mod trunk;

pub use self::space_colonization::*;
pub use self::tmd::*;
pub use self::trunk::*;

use crate::barcode::Barcode;
use crate::error::{GrowthError, Result};
use crate::params::{GrowthMethod, TreeDistributions, TreeParameters};
use crate::sample::Distribution;
use crate::section::*;
use crate::spatial::SpaceColonizationContext;
use rand::Rng;

/// Decides stops and child directions of the sections of one tree.
#[derive(Clone, Debug)]
pub enum GrowthAlgorithm {
    Trunk(TrunkAlgo),
    Tmd(TmdAlgo),
    TmdApical(TmdApicalAlgo),
    TmdGradient(TmdGradientAlgo),
    SpaceColonization(SpaceColonization),
    SpaceColonizationTarget(SpaceColonizationTarget),
}

impl GrowthAlgorithm {
    /// Builds the algorithm, sampling its barcode from the distributions.
    pub fn new<R: Rng + ?Sized>(
        params: &TreeParameters,
        distributions: &TreeDistributions,
        rng: &mut R,
    ) -> Result<Self> {
        let tmd = |rng: &mut R| -> Result<TmdAlgo> {
            let bars = select_persistence(params, distributions, rng)?;
            TmdAlgo::new(&bars, params.branching_method)
        };
        Ok(match params.growth {
            GrowthMethod::Trunk { num_seg } => Self::Trunk(TrunkAlgo::new(num_seg)),
            GrowthMethod::AxonTrunk => Self::Trunk(TrunkAlgo::axon()),
            GrowthMethod::Tmd => Self::Tmd(tmd(rng)?),
            GrowthMethod::TmdApical { has_apical_tuft } => Self::TmdApical(TmdApicalAlgo::new(
                tmd(rng)?,
                has_apical_tuft,
                params.step_size.mean(),
            )),
            GrowthMethod::TmdGradient {
                has_apical_tuft,
                bias,
                bias_length,
            } => {
                let apical = TmdApicalAlgo::new(tmd(rng)?, has_apical_tuft, params.step_size.mean());
                Self::TmdGradient(TmdGradientAlgo::new(apical, bias, bias_length))
            }
            GrowthMethod::SpaceColonization {
                distance_to_domain,
                barcode_scaling,
            } => Self::SpaceColonization(SpaceColonization::new(
                params,
                distributions,
                distance_to_domain,
                barcode_scaling,
                rng,
            )?),
            GrowthMethod::SpaceColonizationTarget {
                target_id,
                distance_soma_target,
                bias,
                barcode_scaling,
            } => Self::SpaceColonizationTarget(SpaceColonizationTarget::new(
                params,
                distributions,
                (target_id, distance_soma_target, bias),
                barcode_scaling,
                rng,
            )?),
        })
    }

    fn tmd(&self) -> Option<&TmdAlgo> {
        match self {
            Self::Trunk(_) => None,
            Self::Tmd(a) => Some(a),
            Self::TmdApical(a) => Some(&a.tmd),
            Self::TmdGradient(a) => Some(&a.apical.tmd),
            Self::SpaceColonization(a) => Some(&a.tmd),
            Self::SpaceColonizationTarget(a) => Some(&a.sc.tmd),
        }
    }

    fn tmd_mut(&mut self) -> Option<&mut TmdAlgo> {
        match self {
            Self::Trunk(_) => None,
            Self::Tmd(a) => Some(a),
            Self::TmdApical(a) => Some(&mut a.tmd),
            Self::TmdGradient(a) => Some(&mut a.apical.tmd),
            Self::SpaceColonization(a) => Some(&mut a.tmd),
            Self::SpaceColonizationTarget(a) => Some(&mut a.sc.tmd),
        }
    }

    pub fn barcode(&self) -> Option<&Barcode> {
        self.tmd().map(TmdAlgo::barcode)
    }

    /// Trunks keep their sections in creation order instead of sorting by bifurcation.
    pub fn is_trunk(&self) -> bool {
        matches!(self, Self::Trunk(_))
    }

    /// Sections of this algorithm need a [SpaceColonizationContext].
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            Self::SpaceColonization(_) | Self::SpaceColonizationTarget(_)
        )
    }

    /// Endfoot target of the root section.
    pub fn target(&self) -> Option<usize> {
        match self {
            Self::SpaceColonizationTarget(a) => Some(a.target_id()),
            _ => None,
        }
    }

    pub fn apical_section(&self) -> Option<SectionId> {
        match self {
            Self::TmdApical(a) => a.apical_section(),
            Self::TmdGradient(a) => a.apical.apical_section(),
            _ => None,
        }
    }

    /// Stop of the root section and the expected number of sections.
    pub fn initialize(&self) -> Result<(Stop, usize)> {
        match (self, self.tmd()) {
            (Self::Trunk(a), _) => Ok(a.initialize()),
            (_, Some(tmd)) => tmd.initialize(),
            (_, None) => Err(GrowthError::NotBarcodeDriven),
        }
    }

    /// Descriptions of the two children of `section`, consuming its bifurcation bar.
    pub fn bifurcate<R: Rng + ?Sized>(
        &mut self,
        section: &mut SectionGrower,
        ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<[SectionData; 2]> {
        match self {
            Self::Trunk(a) => Ok(a.bifurcate(section, rng)),
            Self::Tmd(a) => a.bifurcate(section, rng),
            Self::TmdApical(a) => a.bifurcate(section, rng),
            Self::TmdGradient(a) => a.bifurcate(section, rng),
            Self::SpaceColonization(a) => {
                a.bifurcate(section, ctx.ok_or(GrowthError::MissingContext)?)
            }
            Self::SpaceColonizationTarget(a) => {
                a.bifurcate(section, ctx.ok_or(GrowthError::MissingContext)?)
            }
        }
    }

    /// Consumes the termination bar of `section`.
    pub fn terminate(&mut self, section: &SectionGrower) {
        if let Some(tmd) = self.tmd_mut() {
            tmd.terminate(section);
        }
    }

    /// Grows `section` by one point.
    pub fn extend<R: Rng + ?Sized>(
        &mut self,
        section: &mut SectionGrower,
        step: &Distribution,
        ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<SectionState> {
        match self {
            Self::Trunk(a) => a.extend(section, step, ctx, rng),
            _ => match self.tmd_mut() {
                Some(tmd) => tmd.extend(section, step, ctx, rng),
                None => Err(GrowthError::NotBarcodeDriven),
            },
        }
    }
}
