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

#![doc = include_str!("../README.md")]

//!
//! # Barcode consumption
//! Each tree owns one [Barcode]. Every bar is consumed exactly once, either by the bifurcation
//! of a section or by the termination of one. Children always nest inside their parent:
//! a child never outlives the section it branched from.
//!
//! # Randomness
//! Every stochastic call takes the generator explicitly. Growing with the same seed and inputs
//! gives identical point sequences, and independent generators make parallel runs reproducible.
//!
//! # Errors
//! Broken nesting, too few trees, zero directions and invalid direction weights are
//! reported as [GrowthError]. Unusual but valid situations are logged with `tracing` and growth goes on.

pub mod error;
pub use crate::error::*;

pub mod coords;
pub use crate::coords::*;

pub mod util_funcs;
pub use crate::util_funcs::*;

pub mod rotation;
pub use crate::rotation::*;

pub mod sample;
pub use crate::sample::*;

pub mod stop;
pub use crate::stop::*;

pub mod barcode;
pub use crate::barcode::*;

pub mod bifurcation;
pub use crate::bifurcation::*;

pub mod params;
pub use crate::params::*;

pub mod section;
pub use crate::section::*;

pub mod spatial;
pub use crate::spatial::*;

pub mod algorithms;
pub use crate::algorithms::*;

pub mod tree;
pub use crate::tree::*;

pub mod grower;
pub use crate::grower::*;

pub mod iter;
pub use crate::iter::*;
