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

//! Growth of all trees of one cell around its soma
use crate::coords::*;
use crate::error::{GrowthError, Result};
use crate::params::{TreeDistributions, TreeParameters, TreeType};
use crate::sample::{accept_reject, sample_n_trees, MAX_ACCEPT_TRIES};
use crate::section::SectionId;
use crate::spatial::SpaceColonizationContext;
use crate::tree::{Forest, TreeGrower};
use crate::util_funcs::get_random_point;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Soma {
    pub center: Point,
    pub radius: f64,
}

impl Soma {
    /// Point of the soma surface along `orientation`, which must be a unit vector.
    pub fn surface_point(&self, orientation: Point) -> Point {
        add(self.center, scale(orientation, self.radius))
    }
}

/// Parameters and data of one tree type.
#[derive(Clone, Debug)]
pub struct TreeInput {
    pub parameters: TreeParameters,
    pub distributions: TreeDistributions,
}

#[derive(Clone, Debug)]
pub struct GrownTree {
    pub tree_type: TreeType,
    pub forest: Forest,
    /// last major section before the apical point, for apical trees
    pub apical_section: Option<SectionId>,
}

#[derive(Clone, Debug)]
pub struct Morphology {
    pub soma: Soma,
    pub trees: Vec<GrownTree>,
}

impl Morphology {
    /// Apical sections as `(tree index, section id)`.
    pub fn apical_sections(&self) -> Vec<(usize, SectionId)> {
        self.trees
            .iter()
            .enumerate()
            .filter_map(|(i, t)| Some((i, t.apical_section?)))
            .collect()
    }

    pub fn section_count(&self) -> usize {
        self.trees.iter().map(|t| t.forest.len()).sum()
    }
}

/// Unit orientations for `n` trees, taken from the parameters or sampled away from `existing`.
fn trunk_orientations<R: Rng + ?Sized>(
    params: &TreeParameters,
    n: usize,
    existing: &mut Vec<Point>,
    rng: &mut R,
) -> Result<Vec<Point>> {
    let orientations = match &params.orientation {
        Some(list) => {
            if list.len() < n {
                return Err(GrowthError::NotEnoughOrientations {
                    needed: n,
                    got: list.len(),
                });
            }
            list[..n]
                .iter()
                .map(|o| normalize(*o).ok_or(GrowthError::ZeroDirection))
                .collect::<Result<Vec<Point>>>()?
        }
        None => {
            let mut sampled = Vec::with_capacity(n);
            for _ in 0..n {
                let taken: &[Point] = existing.as_slice();
                let o = accept_reject(
                    |r: &mut R| get_random_point(r),
                    |v: &Point| {
                        let closest = taken.iter().map(|t| dot(*t, *v)).fold(-1.0, f64::max);
                        (1.0 - closest) / 2.0
                    },
                    rng,
                    MAX_ACCEPT_TRIES,
                );
                existing.push(o);
                sampled.push(o);
            }
            return Ok(sampled);
        }
    };
    existing.extend_from_slice(&orientations);
    Ok(orientations)
}

/// Grows every tree of a cell in lockstep.
#[derive(Debug)]
pub struct MorphologyGrower {
    soma: Soma,
    trees: Vec<TreeGrower>,
}

impl MorphologyGrower {
    pub fn new<R: Rng + ?Sized>(
        soma: Soma,
        inputs: &[TreeInput],
        mut ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<Self> {
        let mut trunks: Vec<Point> = vec![];
        let mut trees = vec![];
        for input in inputs {
            let params = &input.parameters;
            let n = match (&input.distributions.num_trees, &params.orientation) {
                (Some(d), _) => sample_n_trees(d, rng)?,
                (None, Some(list)) => list.len(),
                (None, None) => 1,
            };
            let required = params.tree_type.min_trees();
            if n < required {
                return Err(GrowthError::NotEnoughTrees {
                    tree_type: params.tree_type.as_str().to_string(),
                    required,
                    got: n,
                });
            }
            debug!(tree_type = params.tree_type.as_str(), n, "trees to grow");

            for orientation in trunk_orientations(params, n, &mut trunks, rng)? {
                trees.push(TreeGrower::new(
                    soma.surface_point(orientation),
                    orientation,
                    params,
                    &input.distributions,
                    ctx.as_deref_mut(),
                    rng,
                )?);
            }
        }
        Ok(Self { soma, trees })
    }

    pub fn trees(&self) -> &[TreeGrower] {
        &self.trees
    }

    pub fn is_done(&self) -> bool {
        self.trees.iter().all(TreeGrower::is_done)
    }

    /// One point on every active section of every tree.
    pub fn next_point<R: Rng + ?Sized>(
        &mut self,
        mut ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<()> {
        for tree in self.trees.iter_mut().filter(|t| !t.is_done()) {
            tree.next_point(ctx.as_deref_mut(), rng)?;
        }
        Ok(())
    }

    pub fn grow<R: Rng + ?Sized>(
        mut self,
        mut ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<Morphology> {
        while !self.is_done() {
            self.next_point(ctx.as_deref_mut(), rng)?;
        }
        let trees = self
            .trees
            .into_iter()
            .map(|t| GrownTree {
                tree_type: t.tree_type(),
                apical_section: match t.tree_type() {
                    TreeType::ApicalDendrite => t.apical_section(),
                    _ => None,
                },
                forest: t.into_forest(),
            })
            .collect();
        Ok(Morphology {
            soma: self.soma,
            trees,
        })
    }
}
