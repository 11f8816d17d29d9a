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

//! Statistical distributions the growth draws from, and sampling helpers.
//!
//! Every function takes the generator explicitly, there is no global fallback.

use crate::barcode::Bar;
use crate::error::{GrowthError, Result};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution as _;
use rand::Rng;
use rand_distr::{Exp1, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Upper bound on redraws when a strictly positive value is requested.
pub const MAX_DRAW_TRIES: usize = 1000;

/// Default number of proposals for [accept_reject].
pub const MAX_ACCEPT_TRIES: usize = 100;

/// A one-dimensional distribution, in the same shape as the input data files,
/// e.g. `{"norm": {"mean": 1.0, "std": 0.2}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Norm { mean: f64, std: f64 },
    Uniform { min: f64, max: f64 },
    Expon { loc: f64, lambda: f64 },
    Data { bins: Vec<f64>, weights: Vec<f64> },
}

impl Distribution {
    /// Location and scale of the parametric families.
    fn loc_scale(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Norm { mean, std } => Some((mean, std)),
            Self::Uniform { min, max } => Some((min, max - min)),
            Self::Expon { loc, lambda } => Some((loc, 1.0 / lambda)),
            Self::Data { .. } => None,
        }
    }

    pub fn loc(&self) -> f64 {
        self.loc_scale().map_or(0.0, |(loc, _)| loc)
    }

    pub fn scale(&self) -> f64 {
        self.loc_scale().map_or(1.0, |(_, scale)| scale)
    }

    /// Expected value.
    pub fn mean(&self) -> f64 {
        match self {
            Self::Norm { mean, .. } => *mean,
            Self::Uniform { min, max } => 0.5 * (min + max),
            Self::Expon { loc, lambda } => loc + 1.0 / lambda,
            Self::Data { bins, weights } => {
                let total: f64 = weights.iter().sum();
                bins.iter().zip(weights).map(|(b, w)| b * w).sum::<f64>() / total
            }
        }
    }

    fn standard<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Norm { .. } => StandardNormal.sample(rng),
            Self::Expon { .. } => Exp1.sample(rng),
            _ => rng.random::<f64>(),
        }
    }

    fn choose<R: Rng + ?Sized>(bins: &[f64], weights: &[f64], rng: &mut R) -> Result<f64> {
        let index = WeightedIndex::new(weights)
            .map_err(|e| GrowthError::InvalidDistribution(e.to_string()))?;
        Ok(bins[index.sample(rng)])
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        match self {
            Self::Data { bins, weights } => Self::choose(bins, weights, rng),
            _ => {
                let (loc, scale) = self.loc_scale().unwrap_or((0.0, 1.0));
                Ok(loc + scale * self.standard(rng))
            }
        }
    }

    /// Draws until a strictly positive value comes out.
    pub fn draw_positive<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        if let Self::Data { bins, weights } = self {
            let (bins, weights): (Vec<f64>, Vec<f64>) = bins
                .iter()
                .zip(weights)
                .filter(|(b, _)| **b > 0.0)
                .unzip();
            if bins.is_empty() {
                return Err(GrowthError::InvalidDistribution(
                    "no positive bin in data distribution".into(),
                ));
            }
            return Self::choose(&bins, &weights, rng);
        }

        let (loc, scale) = self.loc_scale().unwrap_or((0.0, 1.0));
        if scale == 0.0 {
            if loc >= 0.0 {
                return Ok(loc);
            }
            return Err(GrowthError::InvalidDistribution(format!(
                "loc must be >= 0 when scale is 0 (loc = {loc})"
            )));
        }
        for _ in 0..MAX_DRAW_TRIES {
            let val = loc + scale * self.standard(rng);
            if val > 0.0 {
                return Ok(val);
            }
        }
        Err(GrowthError::NonPositiveSample(MAX_DRAW_TRIES))
    }
}

/// Picks one persistence diagram uniformly from the population.
pub fn sample_ph<'a, R: Rng + ?Sized>(population: &'a [Vec<Bar>], rng: &mut R) -> Result<&'a [Bar]> {
    if population.is_empty() {
        return Err(GrowthError::NoPersistenceDiagram);
    }
    Ok(&population[rng.random_range(0..population.len())])
}

/// Number of trees of one type, truncated toward zero like an integer cast.
pub fn sample_n_trees<R: Rng + ?Sized>(distribution: &Distribution, rng: &mut R) -> Result<usize> {
    let n = distribution.draw(rng)?;
    Ok(if n > 0.0 { n as usize } else { 0 })
}

/// Generic rejection sampling.
///
/// Each proposal is accepted with the probability returned by `probability`. When `max_tries`
/// proposals were all rejected, the one with the highest probability is returned instead.
pub fn accept_reject<T, P, F, R>(
    mut propose: P,
    mut probability: F,
    rng: &mut R,
    max_tries: usize,
) -> T
where
    P: FnMut(&mut R) -> T,
    F: FnMut(&T) -> f64,
    R: Rng + ?Sized,
{
    let mut best = propose(rng);
    let mut best_p = probability(&best);
    if rng.random::<f64>() < best_p {
        return best;
    }
    for _ in 1..max_tries {
        let proposal = propose(rng);
        let p = probability(&proposal);
        if rng.random::<f64>() < p {
            return proposal;
        }
        if p > best_p {
            best = proposal;
            best_p = p;
        }
    }
    warn!(max_tries, best_p, "maximum number of tries reached in accept/reject, using best proposal");
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn parse_input_format() {
        let d: Distribution = serde_json::from_str(r#"{"norm": {"mean": 1.0, "std": 0.2}}"#).unwrap();
        assert_eq!(d, Distribution::Norm { mean: 1.0, std: 0.2 });
        let d: Distribution =
            serde_json::from_str(r#"{"expon": {"loc": 0.5, "lambda": 2.0}}"#).unwrap();
        assert_eq!(d.mean(), 1.0);
        let d: Distribution =
            serde_json::from_str(r#"{"data": {"bins": [1, 2], "weights": [1, 3]}}"#).unwrap();
        assert_eq!(d.mean(), 1.75);
    }

    #[test]
    fn positive_draws() {
        let mut rng = SmallRng::seed_from_u64(42);
        let d = Distribution::Norm { mean: 0.1, std: 1.0 };
        for _ in 0..500 {
            assert!(d.draw_positive(&mut rng).unwrap() > 0.0);
        }
        let d = Distribution::Uniform { min: -1.0, max: 1.0 };
        for _ in 0..500 {
            let v = d.draw_positive(&mut rng).unwrap();
            assert!(v > 0.0 && v < 1.0);
        }
        let d = Distribution::Data {
            bins: vec![-1.0, 0.0, 3.0],
            weights: vec![10.0, 10.0, 1.0],
        };
        for _ in 0..100 {
            assert_eq!(d.draw_positive(&mut rng).unwrap(), 3.0);
        }
    }

    #[test]
    fn degenerate_scale() {
        let mut rng = SmallRng::seed_from_u64(42);
        let d = Distribution::Norm { mean: 2.0, std: 0.0 };
        assert_eq!(d.draw_positive(&mut rng).unwrap(), 2.0);
        let d = Distribution::Norm { mean: -2.0, std: 0.0 };
        assert!(matches!(
            d.draw_positive(&mut rng),
            Err(GrowthError::InvalidDistribution(_))
        ));
        let d = Distribution::Norm { mean: -1e6, std: 1.0 };
        assert!(matches!(
            d.draw_positive(&mut rng),
            Err(GrowthError::NonPositiveSample(MAX_DRAW_TRIES))
        ));
    }

    #[test]
    fn n_trees_truncates() {
        let mut rng = SmallRng::seed_from_u64(42);
        let d = Distribution::Uniform { min: 2.0, max: 2.5 };
        assert_eq!(sample_n_trees(&d, &mut rng).unwrap(), 2);
        let d = Distribution::Uniform { min: -3.0, max: -2.0 };
        assert_eq!(sample_n_trees(&d, &mut rng).unwrap(), 0);
    }

    #[test]
    fn ph_population() {
        let mut rng = SmallRng::seed_from_u64(42);
        assert!(matches!(
            sample_ph(&[], &mut rng),
            Err(GrowthError::NoPersistenceDiagram)
        ));
        let one = vec![Bar::new(10.0, 0.0, [f64::NAN; 4])];
        let population = vec![one.clone(), one];
        assert_eq!(sample_ph(&population, &mut rng).unwrap().len(), 1);
    }

    #[test]
    fn accept_reject_falls_back_to_best() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut n = 0;
        let best = accept_reject(
            |_| {
                n += 1;
                n
            },
            |&v| if v == 7 { 1e-300 } else { 0.0 },
            &mut rng,
            20,
        );
        assert_eq!(best, 7);
        let first = accept_reject(|r| r.random_range(0..10), |_| 1.0, &mut rng, 5);
        assert!(first < 10);
    }
}
