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

//! Growth parameters and input distributions of one tree type
use crate::barcode::Bar;
use crate::bifurcation::BranchingMethod;
use crate::coords::Point;
use crate::error::{GrowthError, Result};
use crate::sample::Distribution;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Slope of the exponential bifurcation and termination probabilities.
pub const SCALE_PROB: f64 = 1.0;

/// Weights of the three contributions to a growth direction, plus the stop probability slope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionParameters {
    pub randomness: f64,
    pub targeting: f64,
    pub history: f64,
    pub scale_prob: f64,
}

impl SectionParameters {
    /// Clamps randomness and targeting to `[0, 1]`, gives the remainder to history
    /// and checks that the three weights add up to one.
    pub fn new(randomness: f64, targeting: f64) -> Result<Self> {
        let randomness = randomness.clamp(0.0, 1.0);
        let targeting = targeting.clamp(0.0, 1.0);
        let history = (1.0 - randomness - targeting).clamp(0.0, 1.0);
        debug!(randomness, targeting, history, "section parameters");

        if (randomness + targeting + history - 1.0).abs() > 1e-9 {
            return Err(GrowthError::InvalidWeights {
                randomness,
                targeting,
                history,
            });
        }
        Ok(Self {
            randomness,
            targeting,
            history,
            scale_prob: SCALE_PROB,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeType {
    BasalDendrite,
    ApicalDendrite,
    Axon,
}

impl TreeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasalDendrite => "basal_dendrite",
            Self::ApicalDendrite => "apical_dendrite",
            Self::Axon => "axon",
        }
    }

    /// Minimum number of trees of this type a cell must have.
    pub fn min_trees(&self) -> usize {
        match self {
            Self::BasalDendrite => 2,
            _ => 0,
        }
    }
}

/// Progress measure compared against barcode values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// straight-line distance from the tree's first point
    #[serde(alias = "radial_distances")]
    Radial,
    /// distance along the branches
    #[default]
    #[serde(alias = "path_distances")]
    Path,
}

/// How a tree grows, with the parameters specific to each method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum GrowthMethod {
    /// a single section of `num_seg` points, no barcode
    Trunk { num_seg: usize },
    /// a one-segment stub another process grafts onto
    AxonTrunk,
    Tmd,
    TmdApical {
        #[serde(default)]
        has_apical_tuft: bool,
    },
    TmdGradient {
        #[serde(default)]
        has_apical_tuft: bool,
        bias: f64,
        bias_length: f64,
    },
    SpaceColonization {
        #[serde(default)]
        distance_to_domain: Option<f64>,
        #[serde(default)]
        barcode_scaling: bool,
    },
    SpaceColonizationTarget {
        target_id: usize,
        distance_soma_target: f64,
        bias: f64,
        #[serde(default)]
        barcode_scaling: bool,
    },
}

/// Caller supplied reshaping of the sampled barcode, e.g. a rescaling.
#[derive(Clone)]
pub struct BarcodeTransform(Arc<dyn Fn(&[Bar]) -> Vec<Bar> + Send + Sync>);

impl BarcodeTransform {
    pub fn new(f: impl Fn(&[Bar]) -> Vec<Bar> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, bars: &[Bar]) -> Vec<Bar> {
        (self.0)(bars)
    }
}

impl std::fmt::Debug for BarcodeTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BarcodeTransform(..)")
    }
}

/// Parameters of one tree type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeParameters {
    pub tree_type: TreeType,
    pub randomness: f64,
    pub targeting: f64,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub branching_method: BranchingMethod,
    pub step_size: Distribution,
    pub growth: GrowthMethod,
    /// explicit trunk orientations, sampled when absent
    #[serde(default)]
    pub orientation: Option<Vec<Point>>,
    #[serde(skip)]
    pub modify: Option<BarcodeTransform>,
}

impl TreeParameters {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn section_parameters(&self) -> Result<SectionParameters> {
        SectionParameters::new(self.randomness, self.targeting)
    }
}

/// Biological input data of one tree type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TreeDistributions {
    pub persistence_diagram: Vec<Vec<Bar>>,
    #[serde(default)]
    pub min_bar_length: Option<f64>,
    #[serde(default)]
    pub num_trees: Option<Distribution>,
}

impl TreeDistributions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Warns when the step size is too coarse to resolve the shortest bars.
/// Returns false in that case.
pub fn check_min_bar_length(params: &TreeParameters, distributions: &TreeDistributions) -> bool {
    let Some(min_bar_length) = distributions.min_bar_length else {
        return true;
    };
    let step = params.step_size.mean();
    if step >= min_bar_length {
        warn!(
            "selected step size {step} is too big for bars of size {min_bar_length}, \
             step size should be smaller"
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_then_validate() {
        let p = SectionParameters::new(1.1, -0.1).unwrap();
        assert_eq!(p.randomness, 1.0);
        assert_eq!(p.targeting, 0.0);
        assert_eq!(p.history, 0.0);

        let p = SectionParameters::new(0.2, 0.5).unwrap();
        assert!((p.history - 0.3).abs() < 1e-12);
        assert_eq!(p.scale_prob, 1.0);

        assert!(matches!(
            SectionParameters::new(0.8, 0.8),
            Err(GrowthError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn parse_parameters() {
        let p = TreeParameters::from_json(
            r#"{
                "tree_type": "basal_dendrite",
                "randomness": 0.15,
                "targeting": 0.12,
                "metric": "path_distances",
                "branching_method": "bio_oriented",
                "step_size": {"norm": {"mean": 1.0, "std": 0.2}},
                "growth": {"method": "tmd_gradient", "bias": 0.5, "bias_length": 0.5},
                "orientation": [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]
            }"#,
        )
        .unwrap();
        assert_eq!(p.tree_type, TreeType::BasalDendrite);
        assert_eq!(p.metric, Metric::Path);
        assert_eq!(
            p.growth,
            GrowthMethod::TmdGradient {
                has_apical_tuft: false,
                bias: 0.5,
                bias_length: 0.5
            }
        );
        assert_eq!(p.orientation.as_ref().map(Vec::len), Some(2));
        assert!(p.modify.is_none());

        let g: GrowthMethod = serde_json::from_str(r#"{"method": "trunk", "num_seg": 4}"#).unwrap();
        assert_eq!(g, GrowthMethod::Trunk { num_seg: 4 });
        let g: GrowthMethod = serde_json::from_str(r#"{"method": "axon_trunk"}"#).unwrap();
        assert_eq!(g, GrowthMethod::AxonTrunk);
        assert!(serde_json::from_str::<GrowthMethod>(r#"{"method": "nope"}"#).is_err());
    }

    #[test]
    fn parse_distributions() {
        let d = TreeDistributions::from_json(
            r#"{
                "persistence_diagram": [[[10.0, 0.0, null, null, null, null]]],
                "min_bar_length": 0.5,
                "num_trees": {"uniform": {"min": 2, "max": 3}}
            }"#,
        )
        .unwrap();
        assert_eq!(d.persistence_diagram.len(), 1);
        assert_eq!(d.persistence_diagram[0][0].termination, 10.0);
    }

    #[test]
    fn bar_length_relevance() {
        let mut p = TreeParameters {
            tree_type: TreeType::Axon,
            randomness: 0.0,
            targeting: 1.0,
            metric: Metric::Path,
            branching_method: BranchingMethod::Directional,
            step_size: Distribution::Norm { mean: 1.0, std: 0.0 },
            growth: GrowthMethod::Tmd,
            orientation: None,
            modify: Some(BarcodeTransform::new(|b| b.to_vec())),
        };
        let mut d = TreeDistributions {
            min_bar_length: Some(2.0),
            ..Default::default()
        };
        assert!(check_min_bar_length(&p, &d));
        d.min_bar_length = Some(0.5);
        assert!(!check_min_bar_length(&p, &d));
        p.step_size = Distribution::Norm { mean: 0.1, std: 0.0 };
        assert!(check_min_bar_length(&p, &d));
        assert_eq!(format!("{:?}", p.modify.unwrap()), "BarcodeTransform(..)");
    }
}
