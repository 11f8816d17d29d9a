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

//! Growth of one tree: the active sections and the forest of finished ones
use crate::algorithms::GrowthAlgorithm;
use crate::coords::*;
use crate::error::Result;
use crate::iter::ForestIter;
use crate::params::{check_min_bar_length, TreeDistributions, TreeParameters, TreeType};
use crate::sample::Distribution;
use crate::section::*;
use crate::spatial::SpaceColonizationContext;
use arrayvec::ArrayVec;
use rand::Rng;
use slab::Slab;

/// Finished sections, parents always before their children.
#[derive(Clone, Debug, Default)]
pub struct Forest {
    sections: Vec<Section>,
    children: Vec<ArrayVec<SectionId, 2>>,
}

impl Forest {
    /// Appends a section, its parent must already be in the forest.
    pub fn push(&mut self, section: Section) -> SectionId {
        let id = self.sections.len();
        if let Some(parent) = section.parent {
            debug_assert!(parent < id, "parent {parent} committed after child {id}");
            // a section has at most two children
            debug_assert!(!self.children[parent].is_full());
            self.children[parent].push(id);
        }
        self.sections.push(section);
        self.children.push(ArrayVec::new());
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn children_of(&self, id: SectionId) -> &[SectionId] {
        &self.children[id]
    }

    pub fn roots(&self) -> impl Iterator<Item = SectionId> + '_ {
        (0..self.len()).filter(|&id| self.sections[id].parent.is_none())
    }

    /// Depth-first walk from the roots.
    pub fn iter(&self) -> ForestIter<'_> {
        ForestIter::new(self)
    }

    pub fn terminal_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_empty()).count()
    }

    pub fn bifurcation_count(&self) -> usize {
        self.children.iter().filter(|c| c.len() == 2).count()
    }

    /// Path length from the root to the last point of `id`, summed over the points.
    pub fn path_length(&self, id: SectionId) -> f64 {
        let mut total = 0.0;
        let mut current = Some(id);
        while let Some(i) = current {
            total += self.sections[i].length();
            current = self.sections[i].parent;
        }
        total
    }

    /// Every point of every section, duplicated bifurcation points included.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.sections.iter().flat_map(|s| s.points.iter().copied())
    }
}

impl std::ops::Index<SectionId> for Forest {
    type Output = Section;

    #[inline]
    fn index(&self, id: SectionId) -> &Section {
        &self.sections[id]
    }
}

/// Grows one tree, one point per active section per call to [TreeGrower::next_point].
#[derive(Debug)]
pub struct TreeGrower {
    tree_type: TreeType,
    config: GrowerConfig,
    step: Distribution,
    algorithm: GrowthAlgorithm,
    /// sections still growing
    active: Slab<SectionGrower>,
    /// keys of `active` in activation order
    order: Vec<usize>,
    forest: Forest,
}

impl TreeGrower {
    /// Sets up the algorithm and the root section starting at `initial_point`.
    pub fn new<R: Rng + ?Sized>(
        initial_point: Point,
        initial_direction: Point,
        params: &TreeParameters,
        distributions: &TreeDistributions,
        ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<Self> {
        let section_params = params.section_parameters()?;
        check_min_bar_length(params, distributions);
        let algorithm = GrowthAlgorithm::new(params, distributions, rng)?;
        let config = GrowerConfig {
            params: section_params,
            metric: params.metric,
            origin: initial_point,
            spatial: algorithm.is_spatial(),
        };

        let (stop, num_sections) = algorithm.initialize()?;
        let data = SectionData {
            direction: initial_direction,
            first_point: initial_point,
            stop,
            process: Process::Major,
            target: algorithm.target(),
        };
        let children = if num_sections > 1 { 2 } else { 0 };
        let mut root = SectionGrower::new(None, data, 0.0, children, config)?;
        root.first_point(&params.step_size, ctx, rng)?;

        let mut active = Slab::with_capacity(16);
        let key = active.insert(root);
        Ok(Self {
            tree_type: params.tree_type,
            config,
            step: params.step_size.clone(),
            algorithm,
            active,
            order: vec![key],
            forest: Forest::default(),
        })
    }

    pub fn tree_type(&self) -> TreeType {
        self.tree_type
    }

    pub fn algorithm(&self) -> &GrowthAlgorithm {
        &self.algorithm
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn into_forest(self) -> Forest {
        self.forest
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_sections(&self) -> impl Iterator<Item = &SectionGrower> + '_ {
        self.order.iter().map(|&k| &self.active[k])
    }

    /// Growth ended, no section is active.
    pub fn is_done(&self) -> bool {
        self.active.is_empty()
    }

    pub fn apical_section(&self) -> Option<SectionId> {
        self.algorithm.apical_section()
    }

    /// Grows every active section by one point, earliest bifurcation first.
    pub fn next_point<R: Rng + ?Sized>(
        &mut self,
        mut ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<()> {
        let mut order = self.order.clone();
        if !self.algorithm.is_trunk() {
            let active = &self.active;
            order.sort_by(|a, b| active[*a].stop.bif().total_cmp(&active[*b].stop.bif()));
        }

        for key in order {
            let state = self.algorithm.extend(
                &mut self.active[key],
                &self.step,
                ctx.as_deref_mut(),
                rng,
            )?;
            match state {
                SectionState::Continue => {}
                SectionState::Bifurcate => self.bifurcate(key, ctx.as_deref_mut(), rng)?,
                SectionState::Terminate => {
                    let section = self.deactivate(key);
                    self.algorithm.terminate(&section);
                    self.forest.push(section.into_section());
                }
            }
        }
        Ok(())
    }

    /// Grows until every section has terminated.
    pub fn grow<R: Rng + ?Sized>(
        &mut self,
        mut ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<()> {
        while !self.is_done() {
            self.next_point(ctx.as_deref_mut(), rng)?;
        }
        Ok(())
    }

    fn deactivate(&mut self, key: usize) -> SectionGrower {
        self.order.retain(|k| *k != key);
        self.active.remove(key)
    }

    fn bifurcate<R: Rng + ?Sized>(
        &mut self,
        key: usize,
        mut ctx: Option<&mut SpaceColonizationContext>,
        rng: &mut R,
    ) -> Result<()> {
        let mut parent = self.deactivate(key);
        let parent_id = self.forest.push(parent.to_section());
        parent.id = Some(parent_id);

        let latest = parent.latest_direction();
        let children = self.algorithm.bifurcate(&mut parent, ctx.as_deref_mut(), rng)?;
        for data in children {
            let mut child = SectionGrower::new(Some(parent_id), data, parent.pathlength, 0, self.config)?;
            if let Some(direction) = latest {
                child.push_direction(direction);
            }
            child.first_point(&self.step, ctx.as_deref_mut(), rng)?;
            let key = self.active.insert(child);
            self.order.push(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bifurcation::BranchingMethod;
    use crate::params::{GrowthMethod, Metric};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn trunk_params(num_seg: usize) -> TreeParameters {
        TreeParameters {
            tree_type: TreeType::Axon,
            randomness: 0.0,
            targeting: 1.0,
            metric: Metric::Path,
            branching_method: BranchingMethod::Random,
            step_size: Distribution::Norm { mean: 1.0, std: 0.0 },
            growth: GrowthMethod::Trunk { num_seg },
            orientation: None,
            modify: None,
        }
    }

    #[test]
    fn trunk_is_one_section() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut tree = TreeGrower::new(
            ZERO,
            [0.0, 0.0, 1.0],
            &trunk_params(5),
            &TreeDistributions::default(),
            None,
            &mut rng,
        )
        .unwrap();
        assert_eq!(tree.active_count(), 1);
        tree.grow(None, &mut rng).unwrap();
        assert!(tree.is_done());
        let forest = tree.into_forest();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].points.len(), 5);
        assert!(allclose(forest[0].points[4], [0.0, 0.0, 4.0]));
        assert_eq!(forest.terminal_count(), 1);
        assert_eq!(forest.bifurcation_count(), 0);
        assert!((forest.path_length(0) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn axon_stub() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut params = trunk_params(0);
        params.growth = GrowthMethod::AxonTrunk;
        let mut tree = TreeGrower::new(
            ZERO,
            [1.0, 0.0, 0.0],
            &params,
            &TreeDistributions::default(),
            None,
            &mut rng,
        )
        .unwrap();
        tree.grow(None, &mut rng).unwrap();
        assert_eq!(tree.forest().len(), 1);
        // first point, then one checked step
        assert_eq!(
            tree.forest()[0].points,
            vec![ZERO, [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn zero_direction() {
        let mut rng = SmallRng::seed_from_u64(42);
        let r = TreeGrower::new(
            ZERO,
            ZERO,
            &trunk_params(3),
            &TreeDistributions::default(),
            None,
            &mut rng,
        );
        assert!(matches!(r, Err(crate::error::GrowthError::ZeroDirection)));
    }

    #[test]
    fn forest_links() {
        let section = |parent| Section {
            parent,
            points: vec![ZERO, [1.0, 0.0, 0.0]],
            process: Process::Major,
            pathlength: 0.0,
            stop: Stop::Segments(2),
        };
        let mut forest = Forest::default();
        forest.push(section(None));
        forest.push(section(Some(0)));
        forest.push(section(Some(0)));
        assert_eq!(forest.children_of(0), &[1, 2]);
        assert_eq!(forest.roots().collect::<Vec<_>>(), vec![0]);
        assert_eq!(forest.terminal_count(), 2);
        assert_eq!(forest.bifurcation_count(), 1);
        assert_eq!(forest.path_length(2), 2.0);
        assert_eq!(forest.points().count(), 6);
        assert_eq!(forest.iter().count(), 3);
    }
}
