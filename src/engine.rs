//! Query surface over a compiled formula.
//!
//! Every query reduces to one primitive, [`SatEngine::satisfiable`]: is the
//! formula satisfiable together with a set of assumed literals?
//!
//! ```text
//! valid(P)            = sat(F ∧ P)
//! forced_true(f, P)   = ¬sat(F ∧ P ∧ ¬f)
//! forced_false(f, P)  = ¬sat(F ∧ P ∧ f)
//! ```

use log::debug;
use num_bigint::BigUint;

use crate::feature::FeatureId;
use crate::formula::Formula;
use crate::types::Lit;

/// Stateless, thread-safe query engine holding one immutable [`Formula`].
#[derive(Debug, Clone)]
pub struct SatEngine {
    formula: Formula,
}

/// Unit literals asserting `selected` true and `deselected` false.
pub fn assumption_literals<'a>(
    selected: impl IntoIterator<Item = &'a FeatureId>,
    deselected: impl IntoIterator<Item = &'a FeatureId>,
) -> Vec<Lit> {
    selected
        .into_iter()
        .map(|f| f.var().pos())
        .chain(deselected.into_iter().map(|f| f.var().neg()))
        .collect()
}

impl SatEngine {
    pub fn new(formula: Formula) -> Self {
        Self { formula }
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Whether the formula is satisfiable together with every literal in
    /// `assumptions`.
    pub fn satisfiable(&self, assumptions: &[Lit]) -> bool {
        self.formula.satisfiable(assumptions)
    }

    pub fn is_valid(&self, assumptions: &[Lit]) -> bool {
        self.satisfiable(assumptions)
    }

    /// Whether every model of `assumptions` selects `feature`.
    pub fn is_forced_true(&self, feature: FeatureId, assumptions: &[Lit]) -> bool {
        let res = !self.satisfiable(&with(assumptions, feature.var().neg()));
        debug!("is_forced_true({}) -> {}", feature, res);
        res
    }

    /// Whether no model of `assumptions` selects `feature`.
    pub fn is_forced_false(&self, feature: FeatureId, assumptions: &[Lit]) -> bool {
        let res = !self.satisfiable(&with(assumptions, feature.var().pos()));
        debug!("is_forced_false({}) -> {}", feature, res);
        res
    }

    /// One complete assignment consistent with `assumptions`, if any.
    pub fn witness(&self, assumptions: &[Lit]) -> Option<Vec<Lit>> {
        self.formula.one_sat(assumptions)
    }

    /// Whether the model admits no configuration at all.
    pub fn is_void(&self) -> bool {
        !self.satisfiable(&[])
    }

    /// Features selected in every configuration.
    pub fn core_features(&self) -> Vec<FeatureId> {
        self.features()
            .filter(|&f| self.is_forced_true(f, &[]))
            .collect()
    }

    /// Features selected in no configuration.
    pub fn dead_features(&self) -> Vec<FeatureId> {
        self.features()
            .filter(|&f| self.is_forced_false(f, &[]))
            .collect()
    }

    /// Exact number of valid configurations.
    pub fn count_configurations(&self) -> BigUint {
        self.formula.sat_count()
    }

    fn features(&self) -> impl Iterator<Item = FeatureId> {
        (0..self.formula.num_vars()).map(FeatureId)
    }
}

fn with(assumptions: &[Lit], lit: Lit) -> Vec<Lit> {
    let mut lits = Vec::with_capacity(assumptions.len() + 1);
    lits.extend_from_slice(assumptions);
    lits.push(lit);
    lits
}
