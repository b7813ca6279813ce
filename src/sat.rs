//! Read-only satisfiability queries on a compiled [`Formula`].
//!
//! None of these allocate diagram nodes: assumptions are followed down the
//! frozen node array instead of being conjoined, so a formula can answer
//! queries from any number of threads at once.

use std::collections::HashMap;

use log::debug;
use num_bigint::BigUint;

use crate::formula::Formula;
use crate::reference::Ref;
use crate::types::{Lit, Var};

impl Formula {
    /// Whether some total assignment satisfies the formula and every literal
    /// in `assumptions`.
    ///
    /// Contradictory assumptions (`x` and `~x`) are unsatisfiable.
    pub fn satisfiable(&self, assumptions: &[Lit]) -> bool {
        let Some(values) = assumed_values(assumptions) else {
            debug!("satisfiable: contradictory assumptions {:?}", assumptions);
            return false;
        };
        if values.is_empty() {
            return !self.is_zero(self.root());
        }
        let mut memo = HashMap::new();
        let res = self.reaches_one(self.root(), &values, &mut memo);
        debug!(
            "satisfiable(assumptions = {}) -> {} ({} nodes visited)",
            assumptions.len(),
            res,
            memo.len()
        );
        res
    }

    /// One total model consistent with `assumptions`, sorted by variable.
    ///
    /// Variables left open by the diagram take their assumed value, or
    /// `false` when unassumed.
    pub fn one_sat(&self, assumptions: &[Lit]) -> Option<Vec<Lit>> {
        let values = assumed_values(assumptions)?;
        let mut memo = HashMap::new();
        if !self.reaches_one(self.root(), &values, &mut memo) {
            return None;
        }

        let mut chosen = values.clone();
        let mut current = self.root();
        while !self.is_terminal(current) {
            let v = self.variable(current);
            let high = self.high_node(current);
            let take_high = match values.get(&v) {
                Some(&b) => b,
                None => self.reaches_one(high, &values, &mut memo),
            };
            chosen.insert(v, take_high);
            current = if take_high { high } else { self.low_node(current) };
        }
        debug_assert!(self.is_one(current));

        let model = (1..=self.num_vars() as u32)
            .map(|v| Lit::new(Var::new(v), chosen.get(&v).copied().unwrap_or(false)))
            .collect();
        Some(model)
    }

    /// Number of total assignments over all feature variables that satisfy
    /// the formula.
    pub fn sat_count(&self) -> BigUint {
        let max = BigUint::from(1u32) << self.num_vars();
        let mut cache = HashMap::new();
        self.sat_count_(self.root(), &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<usize, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        }
        if self.is_one(node) {
            return max.clone();
        }

        let regular = node.regular();
        let count = match cache.get(&regular.index()) {
            Some(count) => count.clone(),
            None => {
                let low = self.sat_count_(self.low_node(regular), max, cache);
                let high = self.sat_count_(self.high_node(regular), max, cache);
                // Each branch fixes the node variable, which halves the count.
                let count: BigUint = (low + high) >> 1;
                cache.insert(regular.index(), count.clone());
                count
            }
        };

        if node.is_negated() {
            max - count
        } else {
            count
        }
    }

    fn reaches_one(&self, node: Ref, values: &HashMap<u32, bool>, memo: &mut HashMap<Ref, bool>) -> bool {
        if self.is_terminal(node) {
            return self.is_one(node);
        }
        if let Some(&res) = memo.get(&node) {
            return res;
        }

        let res = match values.get(&self.variable(node)) {
            Some(true) => self.reaches_one(self.high_node(node), values, memo),
            Some(false) => self.reaches_one(self.low_node(node), values, memo),
            None => {
                self.reaches_one(self.high_node(node), values, memo)
                    || self.reaches_one(self.low_node(node), values, memo)
            }
        };
        memo.insert(node, res);
        res
    }
}

/// Variable values demanded by `assumptions`, or `None` if they contradict.
fn assumed_values(assumptions: &[Lit]) -> Option<HashMap<u32, bool>> {
    let mut values = HashMap::with_capacity(assumptions.len());
    for lit in assumptions {
        match values.insert(lit.var().id(), lit.is_positive()) {
            Some(previous) if previous != lit.is_positive() => return None,
            _ => {}
        }
    }
    Some(values)
}
