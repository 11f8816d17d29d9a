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

//! Point-by-point growth of a single branch
use crate::coords::*;
use crate::error::{GrowthError, Result};
use crate::params::{Metric, SectionParameters};
use crate::sample::Distribution;
use crate::spatial::{grow_to_target, SpaceColonizationContext};
use crate::stop::StopCriterion;
use crate::util_funcs::get_random_point;
use arrayvec::ArrayVec;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of past directions a section remembers.
pub const MEMORY: usize = 5;

/// Below this norm a direction sum is left unnormalized.
pub const DISTANCE_MIN: f64 = 1e-8;

/// Weight of the section direction for the first point of a spatial section,
/// the remainder goes to history.
pub const SPATIAL_FIRST_TARGETING: f64 = 0.8;

/// Blend toward the target when an endfoot grows to it.
pub const ENDFOOT_TARGET_WEIGHT: f64 = 0.5;

/// Index of a finished section in the output forest.
pub type SectionId = usize;

/// Category of a branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    #[default]
    Major,
    Secondary,
    /// grows straight to an endfoot target, then terminates
    Endfoot,
}

/// What ends a section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stop {
    /// number of points, never fewer than three since the stop is checked
    /// only after the mandatory first step and one regular step
    Segments(usize),
    /// bars of the tree's barcode
    Tmd(StopCriterion),
}

impl Stop {
    pub fn criterion(&self) -> Option<StopCriterion> {
        match self {
            Self::Tmd(c) => Some(*c),
            Self::Segments(_) => None,
        }
    }

    /// Bifurcation target, used to order the active sections.
    pub fn bif(&self) -> f64 {
        match self {
            Self::Tmd(c) => c.bif,
            Self::Segments(_) => f64::INFINITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionState {
    Continue,
    Bifurcate,
    Terminate,
}

/// Everything a growth algorithm decides about a new section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionData {
    pub direction: Point,
    pub first_point: Point,
    pub stop: Stop,
    pub process: Process,
    pub target: Option<usize>,
}

/// Settings shared by all sections of one tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowerConfig {
    pub params: SectionParameters,
    pub metric: Metric,
    /// first point of the tree, origin of the radial metric
    pub origin: Point,
    /// steer by a seed point cloud
    pub spatial: bool,
}

/// A finished branch as it is committed to the output forest.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Section {
    pub parent: Option<SectionId>,
    pub points: Vec<Point>,
    pub process: Process,
    /// path length from the tree origin to the last point
    pub pathlength: f64,
    /// stop the section ended with
    pub stop: Stop,
}

impl Section {
    /// Sum of the distances between consecutive points.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| distance(w[0], w[1])).sum()
    }

    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

/// Probability to reach `target` from `progress` within the next step.
pub fn transition_probability(target: f64, progress: f64, scale_prob: f64) -> f64 {
    let x = target - progress;
    if x < 0.0 {
        return 1.0;
    }
    (-x * scale_prob).exp()
}

/// A branch under growth.
#[derive(Clone, Debug)]
pub struct SectionGrower {
    pub parent: Option<SectionId>,
    /// set once the section is committed to the forest
    pub id: Option<SectionId>,
    /// unit direction the section aims for
    pub direction: Point,
    pub points: Vec<Point>,
    latest_directions: ArrayVec<Point, MEMORY>,
    pub pathlength: f64,
    pub stop: Stop,
    pub process: Process,
    pub target: Option<usize>,
    /// 2 when the section should bifurcate, 0 when it should terminate
    pub children: usize,
    config: GrowerConfig,
}

impl SectionGrower {
    pub fn new(
        parent: Option<SectionId>,
        data: SectionData,
        pathlength: f64,
        children: usize,
        config: GrowerConfig,
    ) -> Result<Self> {
        let direction = normalize(data.direction).ok_or(GrowthError::ZeroDirection)?;
        Ok(Self {
            parent,
            id: None,
            direction,
            points: vec![data.first_point],
            latest_directions: ArrayVec::new(),
            pathlength: if parent.is_some() { pathlength } else { 0.0 },
            stop: data.stop,
            process: data.process,
            target: data.target,
            children,
            config,
        })
    }

    #[inline]
    pub fn last_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn latest_direction(&self) -> Option<Point> {
        self.latest_directions.last().copied()
    }

    pub fn push_direction(&mut self, direction: Point) {
        if self.latest_directions.is_full() {
            self.latest_directions.remove(0);
        }
        self.latest_directions.push(direction);
    }

    /// Exponentially decaying memory of the past directions, most recent weighted highest.
    pub fn history(&self) -> Point {
        let n = self.latest_directions.len();
        if n == 0 {
            return ZERO;
        }
        let h = self
            .latest_directions
            .iter()
            .enumerate()
            .fold(ZERO, |acc, (i, d)| {
                let k = (MEMORY - n + i + 1) as f64;
                add(acc, scale(*d, (k - MEMORY as f64).exp()))
            });
        let l = norm(h);
        if l > DISTANCE_MIN {
            scale(h, 1.0 / l)
        } else {
            h
        }
    }

    /// Current progress, compared against the barcode values.
    pub fn metric_value(&self) -> f64 {
        match self.config.metric {
            Metric::Path => self.pathlength,
            Metric::Radial => distance(self.last_point(), self.config.origin),
        }
    }

    fn check<R: Rng + ?Sized>(&self, target: f64, progress: f64, rng: &mut R) -> bool {
        if target - progress < 0.0 {
            return true;
        }
        let p = transition_probability(target, progress, self.config.params.scale_prob);
        rng.random::<f64>() < p
    }

    /// True while the section should keep growing. Sets `children` on a stop.
    pub fn check_stop<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        match self.stop {
            Stop::Segments(num_seg) => self.points.len() < num_seg,
            Stop::Tmd(crit) => {
                if self.points.len() < 2 {
                    return true;
                }
                let progress = self.metric_value();
                if self.check(crit.bif, progress, rng) {
                    self.children = 2;
                    return false;
                }
                if self.check(crit.term, progress, rng) {
                    self.children = 0;
                    return false;
                }
                true
            }
        }
    }

    fn state<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SectionState {
        if self.check_stop(rng) {
            SectionState::Continue
        } else if self.children == 0 {
            SectionState::Terminate
        } else {
            SectionState::Bifurcate
        }
    }

    fn add_point(&mut self, point: Point, direction: Point, seg_length: f64) {
        self.pathlength += seg_length;
        self.points.push(point);
        self.push_direction(direction);
    }

    fn add_spatial_point(
        &mut self,
        ctx: &mut SpaceColonizationContext,
        point: Point,
        direction: Point,
        seg_length: f64,
    ) {
        self.add_point(point, direction, seg_length);
        ctx.morphology_points.push(point);
        let kill = ctx.kill_distance(seg_length);
        ctx.point_cloud.remove_hemisphere(point, scale(direction, -1.0), kill);
    }

    /// Mandatory first step after the starting point, without randomness.
    pub fn first_point<R: Rng + ?Sized>(
        &mut self,
        step: &Distribution,
        ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<()> {
        let p = self.config.params;
        let (targeting, history) = if self.config.spatial {
            (SPATIAL_FIRST_TARGETING, 1.0 - SPATIAL_FIRST_TARGETING)
        } else {
            (p.targeting, p.history)
        };
        let direction = normalize(combine(&[
            (targeting, self.direction),
            (history, self.history()),
        ]))
        .unwrap_or(self.direction);
        let seg_length = step.draw_positive(rng)?;
        let point = add(self.last_point(), scale(direction, seg_length));

        if self.config.spatial {
            let ctx = ctx.ok_or(GrowthError::MissingContext)?;
            self.add_spatial_point(ctx, point, direction, seg_length);
        } else {
            self.add_point(point, direction, seg_length);
        }
        Ok(())
    }

    /// Grows one point and decides the section's fate.
    pub fn next<R: Rng + ?Sized>(
        &mut self,
        step: &Distribution,
        ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<SectionState> {
        if self.config.spatial {
            let ctx = ctx.ok_or(GrowthError::MissingContext)?;
            if let Some(state) = self.next_spatial_point(step, ctx, rng)? {
                return Ok(state);
            }
        } else {
            self.next_point(step, rng)?;
        }
        Ok(self.state(rng))
    }

    fn next_point<R: Rng + ?Sized>(&mut self, step: &Distribution, rng: &mut R) -> Result<()> {
        let p = self.config.params;
        let random_point = get_random_point(rng);
        let direction = normalize(combine(&[
            (p.targeting, self.direction),
            (p.randomness, random_point),
            (p.history, self.history()),
        ]))
        .unwrap_or(self.direction);
        let seg_length = step.draw_positive(rng)?;
        let point = add(self.last_point(), scale(direction, seg_length));
        self.add_point(point, direction, seg_length);
        Ok(())
    }

    /// Returns the final state when the section ends before the regular stop check.
    fn next_spatial_point<R: Rng + ?Sized>(
        &mut self,
        step: &Distribution,
        ctx: &mut SpaceColonizationContext,
        rng: &mut R,
    ) -> Result<Option<SectionState>> {
        let p = self.config.params;
        let seg_length = step.draw_positive(rng)?;
        let current = self.last_point();

        let influence = ctx.influence_distance(step.mean());
        let neighbor = match ctx.point_cloud.nearest_neighbor_direction(current, influence) {
            Some(d) => d,
            None => get_random_point(rng),
        };
        let direction = normalize(combine(&[
            (p.targeting, self.direction),
            (p.randomness, neighbor),
            (p.history, self.history()),
        ]))
        .unwrap_or(self.direction);
        let point = add(current, scale(direction, seg_length));

        if self.process == Process::Endfoot {
            self.add_spatial_point(ctx, point, direction, seg_length);
            self.grow_endfoot(ctx, direction, seg_length)?;
            self.children = 0;
            return Ok(Some(SectionState::Terminate));
        }
        if ctx.collides(point, seg_length) {
            self.children = 0;
            return Ok(Some(SectionState::Terminate));
        }
        self.add_spatial_point(ctx, point, direction, seg_length);
        Ok(None)
    }

    fn grow_endfoot(
        &mut self,
        ctx: &mut SpaceColonizationContext,
        direction: Point,
        seg_length: f64,
    ) -> Result<()> {
        let Some(target_id) = self.target else {
            return Ok(());
        };
        let target = ctx.target_point(target_id)?;
        let path = grow_to_target(
            self.last_point(),
            direction,
            target,
            seg_length,
            ENDFOOT_TARGET_WEIGHT,
        );
        for point in path {
            self.pathlength += distance(self.last_point(), point);
            self.points.push(point);
            ctx.morphology_points.push(point);
            ctx.point_cloud.remove_points_around(point, seg_length);
        }
        Ok(())
    }

    pub fn to_section(&self) -> Section {
        Section {
            parent: self.parent,
            points: self.points.clone(),
            process: self.process,
            pathlength: self.pathlength,
            stop: self.stop,
        }
    }

    pub fn into_section(self) -> Section {
        Section {
            parent: self.parent,
            points: self.points,
            process: self.process,
            pathlength: self.pathlength,
            stop: self.stop,
        }
    }
}
