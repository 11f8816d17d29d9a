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

//! Error type shared by the whole crate

use crate::bifurcation::BranchingMethod;

/// Everything that can stop a growth run.
///
/// The nesting variants indicate a defect in the consumption logic rather than bad input,
/// they are never expected on a well-formed barcode.
#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    #[error("broken nesting: child termination {child} exceeds parent termination {parent}")]
    TerminationNesting { child: f64, parent: f64 },

    #[error("broken nesting: child bifurcation {child} exceeds parent termination {parent}")]
    BifurcationNesting { child: f64, parent: f64 },

    #[error("there should be at least {required} {tree_type} trees (got {got})")]
    NotEnoughTrees {
        tree_type: String,
        required: usize,
        got: usize,
    },

    #[error("not enough orientations: {needed} trees but {got} orientations")]
    NotEnoughOrientations { needed: usize, got: usize },

    #[error("initial direction has zero length")]
    ZeroDirection,

    #[error(
        "direction weights must sum to 1 (randomness {randomness}, targeting {targeting}, history {history})"
    )]
    InvalidWeights {
        randomness: f64,
        targeting: f64,
        history: f64,
    },

    #[error("barcode has no bars left")]
    EmptyBarcode,

    #[error("bar {index} terminates at {termination}, not after its bifurcation {bifurcation}")]
    InvalidBar {
        index: usize,
        bifurcation: f64,
        termination: f64,
    },

    #[error("bar {index} has no angles for {branching:?} branching")]
    MissingAngles {
        index: usize,
        branching: BranchingMethod,
    },

    #[error("no persistence diagram to sample from")]
    NoPersistenceDiagram,

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("no positive value drawn after {0} tries")]
    NonPositiveSample(usize),

    #[error("section is not driven by a barcode stop criterion")]
    NotBarcodeDriven,

    #[error("space colonization growth requires a context")]
    MissingContext,

    #[error("endfoot target {0} does not exist")]
    UnknownTarget(usize),

    #[error("malformed input: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GrowthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e = GrowthError::NotEnoughTrees {
            tree_type: "basal_dendrite".into(),
            required: 2,
            got: 1,
        };
        assert_eq!(
            e.to_string(),
            "there should be at least 2 basal_dendrite trees (got 1)"
        );
        let e: GrowthError = serde_json::from_str::<f64>("nope").unwrap_err().into();
        assert!(matches!(e, GrowthError::Json(_)));
        let e = GrowthError::MissingAngles {
            index: 3,
            branching: BranchingMethod::Symmetric,
        };
        assert_eq!(e.to_string(), "bar 3 has no angles for Symmetric branching");
    }
}
