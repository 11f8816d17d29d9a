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

//! Barcode driven growth where bifurcations split toward free seed points.
//!
//! Already grown points repel the children, seeds in front of the section attract them.
//! The target variant additionally pulls major sections toward an endfoot target.
use super::tmd::{select_persistence, TmdAlgo};
use crate::barcode::*;
use crate::bifurcation::{directional, BranchingMethod};
use crate::coords::*;
use crate::error::{GrowthError, Result};
use crate::params::{TreeDistributions, TreeParameters};
use crate::sample::Distribution;
use crate::section::*;
use crate::spatial::{upper_half_ball, Field, SpaceColonizationContext};
use crate::stop::StopCriterion;
use crate::util_funcs::{from_to_direction, in_squared_proximity};
use rand::Rng;
use std::f64::consts::PI;
use tracing::warn;

/// Squared distance below which a bifurcation sends an endfoot to its target.
pub const ENDFOOT_SQUARED_DISTANCE: f64 = 5.0;

/// Half-angle of the front cap excluded from the seed search of major sections.
pub const FRONT_ANGLE: f64 = PI / 3.0;

/// Half-angle of the back cap excluded from the seed search of major sections.
pub const BACK_ANGLE: f64 = PI / 2.5;

/// Barcode whose reach covers `distance`, uniformly among the qualifying ones,
/// stretched to it when `scaling` is set.
fn persistence_reaching<R: Rng + ?Sized>(
    distributions: &TreeDistributions,
    distance: f64,
    scaling: bool,
    rng: &mut R,
) -> Result<Vec<Bar>> {
    let population = &distributions.persistence_diagram;
    let candidates = barcodes_greater_than_distance(population, distance);
    if candidates.is_empty() {
        return Err(GrowthError::NoPersistenceDiagram);
    }
    let bars = &population[candidates[rng.random_range(0..candidates.len())]];
    Ok(if scaling {
        scale_barcode(bars, distance)
    } else {
        bars.clone()
    })
}

/// Mean push away from the `points`, each weighted by `exp(-distance / length_constant)`.
pub fn repulsion(points: &[Point], current: Point, length_constant: f64) -> Point {
    if points.is_empty() {
        return ZERO;
    }
    let sum = points.iter().fold(ZERO, |acc, p| {
        let v = sub(*p, current);
        let length = norm(v);
        if length == 0.0 {
            return acc;
        }
        add(acc, scale(v, (-length / length_constant).exp() / length))
    });
    scale(sum, 1.0 / points.len() as f64)
}

fn unit_vectors(vectors: &[Point], repulsion: Point) -> Vec<(Point, f64)> {
    vectors
        .iter()
        .filter_map(|v| {
            let v = sub(*v, repulsion);
            let length = norm(v);
            (length > 0.0).then(|| (scale(v, 1.0 / length), length))
        })
        .collect()
}

fn least_aligned(units: &[(Point, f64)], with: Point) -> Option<Point> {
    units
        .iter()
        .min_by(|a, b| dot(a.0, with).total_cmp(&dot(b.0, with)))
        .map(|(u, _)| *u)
}

/// First child continues away from the repulsion, the second goes toward the seed
/// least aligned with it.
pub fn primary_strategy(direction: Point, vectors: &[Point], repulsion: Point) -> Option<(Point, Point)> {
    let units = unit_vectors(vectors, repulsion);
    let dir1 = normalize(sub(direction, repulsion))?;
    Some((dir1, least_aligned(&units, dir1)?))
}

/// First child goes toward the closest seed, the second toward the seed least aligned with it.
pub fn secondary_strategy(vectors: &[Point], repulsion: Point) -> Option<(Point, Point)> {
    let units = unit_vectors(vectors, repulsion);
    let dir1 = units.iter().min_by(|a, b| a.1.total_cmp(&b.1))?.0;
    Some((dir1, least_aligned(&units, dir1)?))
}

/// Pure geometry split used when the seeds do not give two distinct directions.
pub fn fallback_strategy(direction: Point, angles: [f64; 4], repulsion: Point) -> (Point, Point) {
    let dir1 = normalize(sub(direction, repulsion)).unwrap_or(direction);
    let (_, dir2) = directional(dir1, angles);
    let dir2 = normalize(sub(dir2, repulsion)).unwrap_or(dir2);
    (dir1, dir2)
}

/// Child directions of a bifurcating section from the seeds around it.
pub fn colonization_split(
    section: &SectionGrower,
    angles: [f64; 4],
    segment_length: f64,
    ctx: &SpaceColonizationContext,
) -> (Point, Point) {
    let current = section.last_point();
    let direction = section.direction;
    let kill = ctx.kill_distance(segment_length);
    let influence = ctx.influence_distance(segment_length);

    let grown = &ctx.morphology_points[..ctx.morphology_points.len().saturating_sub(1)];
    let neighbors = upper_half_ball(grown, current, kill, direction);
    let rep = repulsion(&neighbors, current, kill);

    let ids = if section.process == Process::Major {
        ctx.point_cloud
            .partial_ball_query(current, influence, direction, FRONT_ANGLE, BACK_ANGLE)
    } else {
        ctx.point_cloud.upper_half_ball_query(current, influence, direction)
    };
    let seeds: Vec<Point> = ids
        .iter()
        .map(|&id| sub(ctx.point_cloud.point(id), current))
        .collect();

    let split = if seeds.len() < 2 {
        None
    } else if section.process == Process::Major {
        primary_strategy(direction, &seeds, rep)
    } else {
        secondary_strategy(&seeds, rep)
    };
    match split {
        Some((dir1, dir2)) if !allclose(dir1, dir2) => (dir1, dir2),
        Some(_) => {
            warn!("identical child directions, using the fallback split");
            fallback_strategy(direction, angles, rep)
        }
        None => fallback_strategy(direction, angles, rep),
    }
}

/// Bends `direction` toward `target` by the field strength at the relative distance.
pub fn add_attraction_bias(
    current: Point,
    target: Point,
    max_target_distance: f64,
    direction: Point,
    field: &Field,
) -> Point {
    let (target_direction, distance) = from_to_direction(current, target);
    let fraction = (distance / max_target_distance).clamp(0.0, 1.0);
    let a = field.eval(fraction);
    let a = if a.is_nan() { 0.0 } else { a.clamp(0.0, 1.0) };
    normalize(combine(&[(a, target_direction), (1.0 - a, direction)])).unwrap_or(direction)
}

/// Major when the section can still reach further than `threshold`.
fn majorize(process: Process, stop: &StopCriterion, threshold: f64) -> Process {
    let length = stop.expected_maximum_length();
    if length.is_finite() && length > threshold {
        Process::Major
    } else {
        process
    }
}

/// Barcode growth with seed driven bifurcations.
#[derive(Clone, Debug)]
pub struct SpaceColonization {
    pub(crate) tmd: TmdAlgo,
    step_mean: f64,
}

impl SpaceColonization {
    pub fn new<R: Rng + ?Sized>(
        params: &TreeParameters,
        distributions: &TreeDistributions,
        distance_to_domain: Option<f64>,
        barcode_scaling: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let bars = match distance_to_domain {
            Some(distance) => persistence_reaching(distributions, distance, barcode_scaling, rng)?,
            None => select_persistence(params, distributions, rng)?,
        };
        Self::from_bars(&bars, &params.step_size)
    }

    /// Splits fall back to directional geometry, so bars need the child angles only.
    pub fn from_bars(bars: &[Bar], step: &Distribution) -> Result<Self> {
        Ok(Self {
            tmd: TmdAlgo::new(bars, BranchingMethod::Directional)?,
            step_mean: step.mean(),
        })
    }

    pub fn bifurcate(
        &mut self,
        section: &mut SectionGrower,
        ctx: &SpaceColonizationContext,
    ) -> Result<[SectionData; 2]> {
        let angles = self.tmd.consume_bifurcation(section)?;
        let (dir1, dir2) = colonization_split(section, angles, self.step_mean, ctx);
        let (stop1, stop2) = self.tmd.get_stop_criteria(section)?;
        Ok(TmdAlgo::children(
            section,
            (dir1, section.process),
            (dir2, Process::Secondary),
            (stop1, stop2),
        ))
    }
}

/// Space colonization heading for one endfoot target.
#[derive(Clone, Debug)]
pub struct SpaceColonizationTarget {
    pub(crate) sc: SpaceColonization,
    target_id: usize,
    distance_soma_target: f64,
    bias: f64,
}

impl SpaceColonizationTarget {
    pub fn new<R: Rng + ?Sized>(
        params: &TreeParameters,
        distributions: &TreeDistributions,
        (target_id, distance_soma_target, bias): (usize, f64, f64),
        barcode_scaling: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let bars = persistence_reaching(distributions, distance_soma_target, barcode_scaling, rng)?;
        Ok(Self {
            sc: SpaceColonization::from_bars(&bars, &params.step_size)?,
            target_id,
            distance_soma_target,
            bias,
        })
    }

    pub fn target_id(&self) -> usize {
        self.target_id
    }

    pub fn bifurcate(
        &mut self,
        section: &mut SectionGrower,
        ctx: &mut SpaceColonizationContext,
    ) -> Result<[SectionData; 2]> {
        let parent_stop = section.stop.criterion().ok_or(GrowthError::NotBarcodeDriven)?;
        let angles = self.sc.tmd.consume_bifurcation(section)?;
        let (mut dir1, mut dir2) = colonization_split(section, angles, self.sc.step_mean, ctx);
        let (mut process1, mut process2) = (section.process, Process::Secondary);

        let id = self.target_id;
        let targets = ctx
            .endfeet_targets
            .as_mut()
            .ok_or(GrowthError::UnknownTarget(id))?;
        if targets.is_active(id)? {
            let current = section.last_point();
            let target = targets.point(id)?;
            if in_squared_proximity(current, target, ENDFOOT_SQUARED_DISTANCE) {
                process2 = Process::Endfoot;
                targets.deactivate(id)?;
                dir2 = normalize(sub(target, current)).unwrap_or(dir2);
            } else if process1 == Process::Major {
                dir1 = add_attraction_bias(current, target, self.distance_soma_target, dir1, &ctx.field);
            } else {
                process1 = majorize(process1, &parent_stop, self.bias * self.distance_soma_target);
            }
        }

        let stops = self.sc.tmd.get_stop_criteria(section)?;
        let mut data = TmdAlgo::children(section, (dir1, process1), (dir2, process2), stops);
        for child in data.iter_mut() {
            child.target = Some(id);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{ContextParameters, SeedParameters};

    fn ctx(seeds: Vec<Point>, targets: Option<Vec<Point>>) -> SpaceColonizationContext {
        SpaceColonizationContext::new(
            ContextParameters {
                space_colonization: SeedParameters {
                    point_cloud: seeds,
                    kill_distance_factor: 1.0,
                    influence_distance_factor: 10.0,
                    cell_size: None,
                },
                endfeet_targets: targets,
                field: Field::default(),
            },
            None,
        )
    }

    #[test]
    fn repulsion_points_toward_neighbors() {
        assert_eq!(repulsion(&[], ZERO, 1.0), ZERO);
        let r = repulsion(&[[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]], ZERO, 1.0);
        assert!((r[0] - (-1.0f64).exp() / 2.0).abs() < 1e-12);
        assert!((r[1] - (-2.0f64).exp() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn strategies() {
        let seeds = [[1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [3.0, 0.0, 0.0]];
        let (d1, d2) = primary_strategy([1.0, 0.0, 0.0], &seeds, ZERO).unwrap();
        assert_eq!(d1, [1.0, 0.0, 0.0]);
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!(allclose(d2, [h, h, 0.0]));

        let (d1, d2) = secondary_strategy(&seeds, ZERO).unwrap();
        assert!(allclose(d1, [h, h, 0.0]));
        assert!(allclose(d2, [h, -h, 0.0]));
        assert!(secondary_strategy(&[], ZERO).is_none());
    }

    #[test]
    fn fallback_is_directional() {
        let angles = [0.0, 0.0, std::f64::consts::FRAC_PI_2, 0.0];
        let (d1, d2) = fallback_strategy([1.0, 0.0, 0.0], angles, ZERO);
        assert_eq!(d1, [1.0, 0.0, 0.0]);
        assert!(allclose(d2, [0.0, 1.0, 0.0]));
    }

    #[test]
    fn attraction() {
        let field = Field::Logit {
            slope: 0.0,
            intercept: 1.0,
        };
        let d = add_attraction_bias(ZERO, [0.0, 5.0, 0.0], 10.0, [1.0, 0.0, 0.0], &field);
        assert!(allclose(d, [0.0, 1.0, 0.0]));
        let field = Field::Logit {
            slope: 0.0,
            intercept: -3.0,
        };
        let d = add_attraction_bias(ZERO, [0.0, 5.0, 0.0], 10.0, [1.0, 0.0, 0.0], &field);
        assert!(allclose(d, [1.0, 0.0, 0.0]));
    }

    #[test]
    fn split_without_seeds_falls_back() {
        use crate::section::tests::config;
        let ctx = ctx(vec![], None);
        let data = SectionData {
            direction: [1.0, 0.0, 0.0],
            first_point: ZERO,
            stop: Stop::Segments(2),
            process: Process::Major,
            target: None,
        };
        let section = SectionGrower::new(None, data, 0.0, 2, config(0.0, 1.0)).unwrap();
        let angles = [0.0, 0.0, std::f64::consts::FRAC_PI_2, 0.0];
        let (d1, d2) = colonization_split(&section, angles, 1.0, &ctx);
        assert_eq!(d1, [1.0, 0.0, 0.0]);
        assert!(allclose(d2, [0.0, 1.0, 0.0]));
    }

    #[test]
    fn split_toward_seeds() {
        use crate::section::tests::config;
        let ctx = ctx(vec![[2.0, 2.0, 0.0], [2.0, -2.0, 0.0], [-3.0, 0.0, 0.0]], None);
        let data = SectionData {
            direction: [1.0, 0.0, 0.0],
            first_point: ZERO,
            stop: Stop::Segments(2),
            process: Process::Secondary,
            target: None,
        };
        let section = SectionGrower::new(None, data, 0.0, 2, config(0.0, 1.0)).unwrap();
        let (d1, d2) = colonization_split(&section, [f64::NAN; 4], 1.0, &ctx);
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!(allclose(d1, [h, h, 0.0]));
        assert!(allclose(d2, [h, -h, 0.0]));
    }

    #[test]
    fn child_angles_suffice() {
        let nan = f64::NAN;
        let step = Distribution::Norm { mean: 1.0, std: 0.0 };
        let bars = [
            Bar::new(100.0, 0.0, [nan; 4]),
            Bar::new(60.0, 10.0, [nan, nan, 0.8, 0.3]),
        ];
        assert!(SpaceColonization::from_bars(&bars, &step).is_ok());
        let bars = [Bar::new(100.0, 0.0, [nan; 4]), Bar::new(60.0, 10.0, [nan; 4])];
        assert!(matches!(
            SpaceColonization::from_bars(&bars, &step),
            Err(GrowthError::MissingAngles { index: 1, .. })
        ));
    }
}
