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

//! Persistence barcodes and their single-use consumption during growth.
//!
//! A [Barcode] is an arena of bars sorted by bifurcation. The index of a bar in the arena is its
//! [BarId], which stays stable for the whole growth. Consumption is tracked with one availability
//! bit per bar and per role, so bifurcations and terminations are removed independently.

use crate::bifurcation::BranchingMethod;
use crate::error::{GrowthError, Result};
use crate::stop::StopCriterion;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Index of a bar in its barcode.
pub type BarId = usize;

/// One persistence bar with the branching angles recorded at its bifurcation.
///
/// Serialized as a row `[termination, bifurcation, a0, a1, a2, a3]`, `null` standing for NaN.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<f64>>", into = "Vec<Option<f64>>")]
pub struct Bar {
    pub termination: f64,
    pub bifurcation: f64,
    /// parent-child azimuth and elevation, then child-child azimuth and elevation
    pub angles: [f64; 4],
}

impl Bar {
    pub fn new(termination: f64, bifurcation: f64, angles: [f64; 4]) -> Self {
        Self {
            termination,
            bifurcation,
            angles,
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.termination - self.bifurcation).abs()
    }
}

impl TryFrom<Vec<Option<f64>>> for Bar {
    type Error = String;

    fn try_from(row: Vec<Option<f64>>) -> std::result::Result<Self, Self::Error> {
        if row.len() != 2 && row.len() != 6 {
            return Err(format!("a bar has 2 or 6 entries, got {}", row.len()));
        }
        let v: Vec<f64> = row.into_iter().map(|e| e.unwrap_or(f64::NAN)).collect();
        let mut angles = [f64::NAN; 4];
        if v.len() == 6 {
            angles.copy_from_slice(&v[2..]);
        }
        Ok(Self::new(v[0], v[1], angles))
    }
}

impl From<Bar> for Vec<Option<f64>> {
    fn from(bar: Bar) -> Self {
        [bar.termination, bar.bifurcation]
            .into_iter()
            .chain(bar.angles)
            .map(|e| if e.is_nan() { None } else { Some(e) })
            .collect()
    }
}

/// Rounding applied to barcode values, 4 decimals.
#[inline]
pub fn round_num(x: f64) -> f64 {
    (x * 1e4).round() / 1e4
}

/// Checks that every bar terminates after it bifurcates.
pub fn validate(bars: &[Bar]) -> Result<()> {
    for (index, bar) in bars.iter().enumerate() {
        if bar.termination <= bar.bifurcation {
            return Err(GrowthError::InvalidBar {
                index,
                bifurcation: bar.bifurcation,
                termination: bar.termination,
            });
        }
    }
    Ok(())
}

/// Mutable single-use registry of bars, owned by one growth algorithm for one tree.
#[derive(Clone, Debug)]
pub struct Barcode {
    /// bars sorted by bifurcation, values rounded
    bars: Vec<Bar>,
    /// ids sorted by termination value
    term_order: Vec<BarId>,
    bif_available: Vec<bool>,
    term_available: Vec<bool>,
}

impl Barcode {
    /// Builds the registry. The bifurcation of the first bar is the trivial root one and is
    /// never available.
    pub fn new(bars: &[Bar]) -> Result<Self> {
        if bars.is_empty() {
            return Err(GrowthError::EmptyBarcode);
        }
        let mut bars: Vec<Bar> = bars
            .iter()
            .map(|b| Bar::new(round_num(b.termination), round_num(b.bifurcation), b.angles))
            .collect();
        bars.sort_by(|a, b| a.bifurcation.total_cmp(&b.bifurcation));

        let mut term_order: Vec<BarId> = (0..bars.len()).collect();
        term_order.sort_by(|&a, &b| bars[a].termination.total_cmp(&bars[b].termination));

        let mut bif_available = vec![true; bars.len()];
        bif_available[0] = false;
        let term_available = vec![true; bars.len()];

        Ok(Self {
            bars,
            term_order,
            bif_available,
            term_available,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn angles(&self, id: BarId) -> [f64; 4] {
        self.bars[id].angles
    }

    /// Every bar that can bifurcate must carry the angles `branching` reads.
    /// The root bar never splits, its angles are ignored.
    pub fn check_angles(&self, branching: BranchingMethod) -> Result<()> {
        let used = branching.angles_used();
        match (1..self.len()).find(|&id| used.iter().any(|&a| self.bars[id].angles[a].is_nan())) {
            Some(index) => Err(GrowthError::MissingAngles { index, branching }),
            None => Ok(()),
        }
    }

    /// Termination of the trunk bar, the longest reach of the tree.
    pub fn persistence_length(&self) -> f64 {
        self.bars[0].termination
    }

    /// Largest bifurcation still available.
    pub fn last_bifurcation(&self) -> Option<f64> {
        (0..self.len())
            .rev()
            .find(|&id| self.bif_available[id])
            .map(|id| self.bars[id].bifurcation)
    }

    pub fn remaining_bifurcations(&self) -> usize {
        self.bif_available.iter().filter(|a| **a).count()
    }

    pub fn remaining_terminations(&self) -> usize {
        self.term_available.iter().filter(|a| **a).count()
    }

    duplicate::duplicate! {
        [
            min_name   is_available          remove_name    ids                                 available         field           miss;
            [min_bif]  [is_bif_available]    [remove_bif]   [(0..self.bars.len())]              [bif_available]   [bifurcation]   [f64::INFINITY];
            [min_term] [is_term_available]   [remove_term]  [self.term_order.iter().copied()]   [term_available]  [termination]   [0.0];
        ]
        /// First value in `[above, below]` in scan order, with its id.
        /// An infinite `above` is read as 0. On a miss the id is None.
        pub fn min_name(&self, above: f64, below: f64) -> (Option<BarId>, f64) {
            let above = if above.is_infinite() { 0.0 } else { above };
            ids
                .filter(|&id| self.available[id])
                .map(|id| (id, self.bars[id].field))
                .find(|&(_, v)| above <= v && v <= below)
                .map_or((None, miss), |(id, v)| (Some(id), v))
        }

        #[inline]
        pub fn is_available(&self, id: Option<BarId>) -> bool {
            id.is_some_and(|id| self.available.get(id).copied().unwrap_or(false))
        }

        /// Consumes the bar in this role, no-op for None.
        pub fn remove_name(&mut self, id: Option<BarId>) {
            if let Some(id) = id {
                debug_assert!(self.available[id], "bar {id} consumed twice");
                self.available[id] = false;
            }
        }
    }

    /// Largest termination still available.
    pub fn max_term(&self) -> Result<(BarId, f64)> {
        self.term_order
            .iter()
            .rev()
            .find(|&&id| self.term_available[id])
            .map(|&id| (id, self.bars[id].termination))
            .ok_or(GrowthError::EmptyBarcode)
    }

    /// Termination of a bar, `-inf` if the id is None or its termination was consumed.
    pub fn get_term(&self, id: Option<BarId>) -> f64 {
        match id {
            Some(id) if self.is_term_available(Some(id)) => self.bars[id].termination,
            _ => f64::NEG_INFINITY,
        }
    }

    /// Termination of a bar if it is available and lies in `[above, below]`.
    pub fn get_term_between(&self, id: Option<BarId>, above: f64, below: f64) -> (Option<BarId>, f64) {
        let term = self.get_term(id);
        if term.is_finite() && above <= term && term <= below {
            (id, term)
        } else {
            (None, f64::NEG_INFINITY)
        }
    }

    /// First available bifurcation whose value and own termination both lie in the given ranges.
    pub fn select_compatible_bif(
        &self,
        below_bif: f64,
        above_bif: f64,
        below_term: f64,
        above_term: f64,
    ) -> (Option<BarId>, f64) {
        (0..self.len())
            .filter(|&id| self.bif_available[id])
            .map(|id| (id, self.bars[id].bifurcation, self.get_term(Some(id))))
            .find(|&(_, bif, term)| {
                below_bif <= bif && bif <= above_bif && below_term <= term && term <= above_term
            })
            .map_or((None, f64::INFINITY), |(id, bif, _)| (Some(id), bif))
    }

    /// Makes `child` nest inside `parent`.
    ///
    /// When the bar bound to the child's bifurcation would outlive the child's termination, the
    /// bifurcation is rebound to the first bar fitting inside `[parent.reference, parent.term]`
    /// and ending before the child does, or unbound if there is none.
    pub fn curate_stop_criterion(
        &self,
        parent: &StopCriterion,
        child: StopCriterion,
    ) -> Result<StopCriterion> {
        let max_ref = parent.term;
        if child.term > max_ref {
            return Err(GrowthError::TerminationNesting {
                child: child.term,
                parent: max_ref,
            });
        }
        if child.bif.is_finite() && child.bif > max_ref {
            return Err(GrowthError::BifurcationNesting {
                child: child.bif,
                parent: max_ref,
            });
        }

        if self.get_term(child.bif_id) <= child.term {
            return Ok(child);
        }

        let mut target = child;
        target.update_bif(self.select_compatible_bif(
            parent.reference,
            max_ref,
            parent.reference,
            child.term,
        ));
        Ok(target)
    }
}

/// Multiplies bifurcation and termination of every bar, angles stay.
pub fn scale_bars(bars: &[Bar], factor: f64) -> Vec<Bar> {
    bars.iter()
        .map(|b| Bar::new(b.termination * factor, b.bifurcation * factor, b.angles))
        .collect()
}

fn extent(bars: &[Bar]) -> f64 {
    bars.iter()
        .flat_map(|b| [b.termination, b.bifurcation])
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Stretches a barcode so that it reaches at least `target_distance`.
pub fn scale_barcode(bars: &[Bar], target_distance: f64) -> Vec<Bar> {
    let distance = extent(bars);
    if target_distance > distance && distance > 0.0 {
        return scale_bars(bars, target_distance / distance);
    }
    bars.to_vec()
}

/// Indices of the diagrams whose longest bar reaches `target_extent`.
///
/// If none does, the index of the longest one alone is returned.
pub fn barcodes_greater_than_distance(population: &[Vec<Bar>], target_extent: f64) -> Vec<usize> {
    let max_extents: Vec<f64> = population
        .iter()
        .map(|ph| ph.iter().map(Bar::length).fold(f64::NEG_INFINITY, f64::max))
        .collect();
    let close = |a: f64, b: f64| (a - b).abs() <= 1e-8 + 1e-5 * b.abs();
    let selected: Vec<usize> = max_extents
        .iter()
        .enumerate()
        .filter(|(_, &e)| e > target_extent || close(e, target_extent))
        .map(|(i, _)| i)
        .collect();

    if selected.is_empty() && !population.is_empty() {
        warn!("all barcodes are smaller than target {target_extent}, the longest is returned");
        let longest = max_extents
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        return vec![longest];
    }
    selected
}

/// Estimates where the apical tuft starts from the profile of the barcode.
///
/// The number of bars alive over the distance range is histogrammed on `3n` bins and smoothed
/// with a moving average of width 3. The apical point is the start of the bin preceding the
/// steepest rise of that profile. None when the profile never rises.
pub fn apical_point_distance(bars: &[Bar]) -> Option<f64> {
    let values = bars
        .iter()
        .flat_map(|b| [b.termination, b.bifurcation])
        .filter(|v| v.is_finite());
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !(hi > lo) {
        return None;
    }

    let num_bins = 3 * bars.len().max(2);
    let width = (hi - lo) / (num_bins - 1) as f64;
    let edges: Vec<f64> = (0..num_bins).map(|i| lo + i as f64 * width).collect();
    let counts: Vec<f64> = edges
        .windows(2)
        .map(|w| {
            bars.iter()
                .filter(|b| {
                    let (start, end) = if b.bifurcation.is_nan() {
                        (lo, b.termination)
                    } else {
                        (b.bifurcation.min(b.termination), b.bifurcation.max(b.termination))
                    };
                    start <= w[1] && end > w[0]
                })
                .count() as f64
        })
        .collect();

    let smoothed: Vec<f64> = (0..counts.len())
        .map(|i| {
            let window = &counts[i.saturating_sub(1)..(i + 2).min(counts.len())];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect();

    let (k, rise) = smoothed
        .windows(2)
        .map(|w| w[1] - w[0])
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, d)| if d > best.1 { (i, d) } else { best });
    (rise > 0.0).then(|| edges[k])
}
