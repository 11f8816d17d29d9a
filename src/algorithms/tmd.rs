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

//! Barcode driven growth and its apical variants
use crate::barcode::*;
use crate::bifurcation::{directional, BranchingMethod};
use crate::coords::*;
use crate::error::{GrowthError, Result};
use crate::params::{TreeDistributions, TreeParameters};
use crate::sample::{sample_ph, Distribution};
use crate::section::*;
use crate::spatial::SpaceColonizationContext;
use crate::stop::StopCriterion;
use rand::Rng;
use tracing::{debug, warn};

/// Number of step sizes the apical point sits before the last bifurcation without a tuft.
pub const APICAL_STEPS_BEFORE_LAST_BIF: f64 = 10.0;

/// Picks a barcode from the population and applies the optional transform.
pub fn select_persistence<R: Rng + ?Sized>(
    params: &TreeParameters,
    distributions: &TreeDistributions,
    rng: &mut R,
) -> Result<Vec<Bar>> {
    let bars = sample_ph(&distributions.persistence_diagram, rng)?;
    Ok(match &params.modify {
        Some(transform) => transform.apply(bars),
        None => bars.to_vec(),
    })
}

/// Growth consuming one barcode.
#[derive(Clone, Debug)]
pub struct TmdAlgo {
    pub(crate) barcode: Barcode,
    branching: BranchingMethod,
}

impl TmdAlgo {
    pub fn new(bars: &[Bar], branching: BranchingMethod) -> Result<Self> {
        let barcode = Barcode::new(bars)?;
        barcode.check_angles(branching)?;
        debug!(bars = barcode.len(), "barcode selected");
        Ok(Self { barcode, branching })
    }

    pub fn barcode(&self) -> &Barcode {
        &self.barcode
    }

    pub fn persistence_length(&self) -> f64 {
        self.barcode.persistence_length()
    }

    /// Root stop spanning the whole barcode, and the number of bars.
    pub fn initialize(&self) -> Result<(Stop, usize)> {
        let (term_id, term) = self.barcode.max_term()?;
        let stop = StopCriterion::new(
            0.0,
            self.barcode.min_bif(0.0, f64::INFINITY),
            (Some(term_id), term),
        );
        Ok((Stop::Tmd(stop), self.barcode.len()))
    }

    fn criterion(section: &SectionGrower) -> Result<StopCriterion> {
        section.stop.criterion().ok_or(GrowthError::NotBarcodeDriven)
    }

    /// Consumes the bar the section bifurcates on and returns its angles.
    pub(crate) fn consume_bifurcation(&mut self, section: &SectionGrower) -> Result<[f64; 4]> {
        let bif_id = Self::criterion(section)?.bif_id;
        self.barcode.remove_bif(bif_id);
        Ok(bif_id.map_or([f64::NAN; 4], |id| self.barcode.angles(id)))
    }

    /// Stops of the two children of a bifurcating section.
    ///
    /// The first child keeps the parent's termination, the second one gets the termination
    /// of the bar just consumed for the bifurcation.
    pub fn get_stop_criteria(&self, section: &mut SectionGrower) -> Result<(Stop, Stop)> {
        let mut parent = Self::criterion(section)?;
        parent.reference = section.metric_value();
        section.stop = Stop::Tmd(parent);

        let mut current = parent;
        current.update_bif(self.barcode.min_bif(parent.reference, parent.term));
        let stop1 = self.barcode.curate_stop_criterion(&parent, current)?;

        current.update_term(
            self.barcode
                .get_term_between(parent.bif_id, parent.bif, current.term),
        );
        let stop2 = self.barcode.curate_stop_criterion(&parent, current)?;
        Ok((Stop::Tmd(stop1), Stop::Tmd(stop2)))
    }

    pub(crate) fn children(
        section: &SectionGrower,
        (dir1, process1): (Point, Process),
        (dir2, process2): (Point, Process),
        (stop1, stop2): (Stop, Stop),
    ) -> [SectionData; 2] {
        let first_point = section.last_point();
        [
            SectionData {
                direction: dir1,
                first_point,
                stop: stop1,
                process: process1,
                target: section.target,
            },
            SectionData {
                direction: dir2,
                first_point,
                stop: stop2,
                process: process2,
                target: section.target,
            },
        ]
    }

    pub fn bifurcate<R: Rng + ?Sized>(
        &mut self,
        section: &mut SectionGrower,
        rng: &mut R,
    ) -> Result<[SectionData; 2]> {
        let angles = self.consume_bifurcation(section)?;
        let (dir1, dir2) = self.branching.split(section.history(), angles, rng);
        let stops = self.get_stop_criteria(section)?;
        Ok(Self::children(
            section,
            (dir1, section.process),
            (dir2, section.process),
            stops,
        ))
    }

    pub fn terminate(&mut self, section: &SectionGrower) {
        if let Some(crit) = section.stop.criterion() {
            self.barcode.remove_term(crit.term_id);
        }
    }

    /// Rebinds targets whose bars were consumed by another section, then grows one point.
    pub fn extend<R: Rng + ?Sized>(
        &mut self,
        section: &mut SectionGrower,
        step: &Distribution,
        ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<SectionState> {
        let mut crit = Self::criterion(section)?;
        let maximum = crit.term;

        if !self.barcode.is_bif_available(crit.bif_id) && crit.bif.is_finite() {
            crit.update_bif(self.barcode.min_bif(crit.reference, maximum));
            let parent = crit;
            crit = self.barcode.curate_stop_criterion(&parent, crit)?;
        }
        if !self.barcode.is_term_available(crit.term_id) {
            let above = if crit.bif.is_finite() {
                crit.bif
            } else {
                crit.reference
            };
            crit.update_term(self.barcode.min_term(above, maximum));
            let parent = crit;
            crit = self.barcode.curate_stop_criterion(&parent, crit)?;
        }
        section.stop = Stop::Tmd(crit);
        section.next(step, ctx, rng)
    }
}

/// Distance at which the major line of an apical tree ends.
fn apical_distance(bars: &Barcode, has_apical_tuft: bool, step_mean: f64) -> f64 {
    let last_bif = bars.last_bifurcation();
    if has_apical_tuft {
        if let Some(d) = apical_point_distance(bars.bars()) {
            return d;
        }
        warn!("no apical point found in the barcode, using the last bifurcation");
        return last_bif.unwrap_or(0.0);
    }
    last_bif.map_or(0.0, |b| b - APICAL_STEPS_BEFORE_LAST_BIF * step_mean)
}

/// Keeps one major line going up to the apical distance.
#[derive(Clone, Debug)]
pub struct TmdApicalAlgo {
    pub(crate) tmd: TmdAlgo,
    apical_distance: f64,
    apical_section: Option<SectionId>,
    found_last_bif: bool,
}

impl TmdApicalAlgo {
    pub fn new(tmd: TmdAlgo, has_apical_tuft: bool, step_mean: f64) -> Self {
        let apical_distance = apical_distance(&tmd.barcode, has_apical_tuft, step_mean);
        debug!(apical_distance, "apical distance");
        Self {
            tmd,
            apical_distance,
            apical_section: None,
            found_last_bif: false,
        }
    }

    pub fn apical_distance(&self) -> f64 {
        self.apical_distance
    }

    /// Last major section before the apical point.
    pub fn apical_section(&self) -> Option<SectionId> {
        self.apical_section
    }

    pub fn bifurcate<R: Rng + ?Sized>(
        &mut self,
        section: &mut SectionGrower,
        rng: &mut R,
    ) -> Result<[SectionData; 2]> {
        let angles = self.tmd.consume_bifurcation(section)?;
        let current = section.metric_value();

        let (dir1, dir2, process1) = if section.process == Process::Major {
            let (dir1, dir2) = directional(section.direction, angles);
            if !self.found_last_bif {
                self.apical_section = section.id;
            }
            if current <= self.apical_distance {
                (dir1, dir2, Process::Major)
            } else {
                self.found_last_bif = true;
                (dir1, dir2, Process::Secondary)
            }
        } else {
            let (dir1, dir2) = self.tmd.branching.split(section.history(), angles, rng);
            if !self.found_last_bif {
                self.apical_section = section.id;
                if current > self.apical_distance {
                    self.found_last_bif = true;
                }
            }
            (dir1, dir2, Process::Secondary)
        };

        let stops = self.tmd.get_stop_criteria(section)?;
        Ok(TmdAlgo::children(
            section,
            (dir1, process1),
            (dir2, Process::Secondary),
            stops,
        ))
    }
}

/// Apical growth where long secondary branches become major again,
/// bent toward the direction of their parent.
#[derive(Clone, Debug)]
pub struct TmdGradientAlgo {
    pub(crate) apical: TmdApicalAlgo,
    bias: f64,
    bias_length: f64,
}

impl TmdGradientAlgo {
    pub fn new(apical: TmdApicalAlgo, bias: f64, bias_length: f64) -> Self {
        Self {
            apical,
            bias,
            bias_length,
        }
    }

    pub fn bifurcate<R: Rng + ?Sized>(
        &mut self,
        section: &mut SectionGrower,
        rng: &mut R,
    ) -> Result<[SectionData; 2]> {
        let mut children = self.apical.bifurcate(section, rng)?;
        let threshold = self.bias_length * self.apical.tmd.persistence_length();
        for child in children.iter_mut() {
            if child.process == Process::Major {
                continue;
            }
            let Some(stop) = child.stop.criterion() else {
                continue;
            };
            if stop.expected_maximum_length() > threshold {
                child.process = Process::Major;
                let bent = combine(&[
                    (1.0 - self.bias, child.direction),
                    (self.bias, section.direction),
                ]);
                child.direction = normalize(bent).unwrap_or(child.direction);
            }
        }
        Ok(children)
    }
}
