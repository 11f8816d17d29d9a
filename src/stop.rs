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

//! Per-section stop criteria bound to barcode bars
use crate::barcode::BarId;
use serde::Serialize;

/// Where a growing section should bifurcate and where it should terminate.
///
/// All values are in units of the growth metric (path or radial distance).
/// An unbound bifurcation is `+inf` with no id, the section can then only terminate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StopCriterion {
    /// metric value at the start of the section
    pub reference: f64,
    pub bif_id: Option<BarId>,
    pub bif: f64,
    pub term_id: Option<BarId>,
    pub term: f64,
}

impl StopCriterion {
    pub fn new(reference: f64, (bif_id, bif): (Option<BarId>, f64), (term_id, term): (Option<BarId>, f64)) -> Self {
        Self {
            reference,
            bif_id,
            bif,
            term_id,
            term,
        }
    }

    /// `reference <= bif <= term`, or `reference <= term` when the bifurcation is unbound.
    pub fn verify(&self) -> bool {
        if self.bif.is_infinite() {
            return self.reference <= self.term;
        }
        self.reference <= self.bif && self.bif <= self.term
    }

    #[inline]
    pub fn update_bif(&mut self, (bif_id, bif): (Option<BarId>, f64)) {
        self.bif_id = bif_id;
        self.bif = bif;
    }

    #[inline]
    pub fn update_term(&mut self, (term_id, term): (Option<BarId>, f64)) {
        self.term_id = term_id;
        self.term = term;
    }

    /// Length of the bar between the bound bifurcation and termination.
    pub fn child_length(&self) -> f64 {
        (self.term - self.bif).abs()
    }

    pub fn expected_bifurcation_length(&self) -> f64 {
        if self.bif.is_infinite() {
            return 0.0;
        }
        (self.bif - self.reference).abs()
    }

    pub fn expected_termination_length(&self) -> f64 {
        if self.term.is_infinite() {
            return 0.0;
        }
        (self.term - self.reference).abs()
    }

    /// How far from its reference this section can still reach.
    pub fn expected_maximum_length(&self) -> f64 {
        if self.bif.is_infinite() {
            return (self.reference - self.term).abs();
        }
        (self.reference - self.bif.max(self.term)).abs()
    }
}

struct MaybeId(Option<BarId>);

impl std::fmt::Display for MaybeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => f.write_str("None"),
        }
    }
}

impl std::fmt::Display for StopCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(Ref: {:?}, BifID: {}, Bif: {:?}, TermID: {}, Term: {:?})",
            self.reference,
            MaybeId(self.bif_id),
            self.bif,
            MaybeId(self.term_id),
            self.term
        )
    }
}

/// Checks that both targets lie ahead of `reference` and within `target_length` of it,
/// with the bifurcation before the termination. An infinite bifurcation only checks the termination.
pub fn checks_bif_term(reference: f64, bif: f64, term: f64, target_length: f64) -> bool {
    let term_cond = 0.0 < term - reference && term - reference <= target_length;
    if bif.is_infinite() {
        return term_cond;
    }
    let bif_cond = 0.0 < bif - reference && bif - reference <= target_length;
    term_cond && bif_cond && term > bif
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basal() -> StopCriterion {
        StopCriterion::new(0.0, (Some(1), 9.7747), (Some(0), 159.798))
    }

    #[test]
    fn display() {
        let s = StopCriterion::new(10.0, (Some(1), 26.3027), (Some(0), 633.5966));
        assert_eq!(
            s.to_string(),
            "(Ref: 10.0, BifID: 1, Bif: 26.3027, TermID: 0, Term: 633.5966)"
        );
        let s = StopCriterion::new(1.0, (None, f64::INFINITY), (Some(2), 3.0));
        assert_eq!(s.to_string(), "(Ref: 1.0, BifID: None, Bif: inf, TermID: 2, Term: 3.0)");
    }

    #[test]
    fn verify() {
        assert!(basal().verify());
        let mut s = basal();
        s.update_bif((None, f64::INFINITY));
        assert!(s.verify());
        s.reference = 200.0;
        assert!(!s.verify());
        let mut s = basal();
        s.update_term((Some(3), 5.0));
        assert!(!s.verify());
    }

    #[test]
    fn lengths() {
        let s = basal();
        assert!((s.child_length() - 150.0233).abs() < 1e-9);
        assert_eq!(s.expected_bifurcation_length(), 9.7747);
        assert_eq!(s.expected_termination_length(), 159.798);
        assert_eq!(s.expected_maximum_length(), 159.798);
        let mut s = s;
        s.update_bif((None, f64::INFINITY));
        assert_eq!(s.expected_bifurcation_length(), 0.0);
        assert_eq!(s.expected_maximum_length(), 159.798);
    }

    #[test]
    fn bif_term_checks() {
        assert!(checks_bif_term(0.0, 1.0, 2.0, 2.0));
        assert!(!checks_bif_term(0.0, 1.0, 2.0, 1.5));
        assert!(!checks_bif_term(0.0, 2.0, 1.0, 3.0));
        assert!(!checks_bif_term(1.0, 0.5, 2.0, 3.0));
        assert!(checks_bif_term(0.0, f64::INFINITY, 2.0, 2.0));
        assert!(!checks_bif_term(2.0, f64::INFINITY, 2.0, 2.0));
    }
}
