//! The decision-diagram manager.
//!
//! [`Bdd`] owns the unique table and the computed table, and is the only
//! place where nodes are created. It is used while a model is compiled;
//! afterwards its nodes are copied into an immutable
//! [`Formula`][crate::formula::Formula] and the manager is dropped.
//!
//! Nodes are hash-consed and edges may be complemented, so for a fixed
//! variable order every boolean function has exactly one [`Ref`], and
//! negation is free.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::error::SolverError;
use crate::node::Node;
use crate::reference::Ref;
use crate::table::Table;
use crate::utils::{pairing3, MyHash};

/// Sizing and budget of a [`Bdd`] manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BddConfig {
    /// The unique table starts with room for `2^storage_bits` nodes.
    pub storage_bits: usize,
    /// The computed table holds `2^cache_bits` entries.
    pub cache_bits: usize,
    /// Hard upper bound on the number of nodes, the terminal included.
    pub max_nodes: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 16,
            cache_bits: 16,
            max_nodes: 1 << 24,
        }
    }
}

impl BddConfig {
    pub fn with_storage_bits(mut self, bits: usize) -> Self {
        self.storage_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct IteKey(Ref, Ref, Ref);

impl MyHash for IteKey {
    fn hash(&self) -> u64 {
        pairing3(
            self.0.unsigned() as u64,
            self.1.unsigned() as u64,
            self.2.unsigned() as u64,
        )
    }
}

pub struct Bdd {
    storage: RefCell<Table<Node>>,
    cache: RefCell<Cache<IteKey, Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn with_config(config: BddConfig) -> Self {
        let mut storage = Table::new(config.storage_bits, config.max_nodes.max(1));

        // The terminal node is always (1).
        let one = match storage.add(Node::default()) {
            Ok(index) => Ref::positive(index as u32),
            Err(_) => unreachable!("node budget admits the terminal"),
        };

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            zero: -one,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("nodes", &storage.size())
            .field("limit", &storage.limit())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    pub fn variable(&self, node: Ref) -> u32 {
        self.storage.borrow().value(node.index()).variable
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.storage.borrow().value(node.index()).low;
        if node.is_negated() {
            -low
        } else {
            low
        }
    }

    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.storage.borrow().value(node.index()).high;
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        self.is_zero(node) || self.is_one(node)
    }

    /// Copy of the node array, indexed like the unique table.
    pub fn nodes(&self) -> Vec<Node> {
        self.storage.borrow().values().copied().collect()
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Result<Ref, SolverError> {
        debug!("mk(v = {}, low = {}, high = {})", v, low, high);

        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle duplicates
        if low == high {
            return Ok(low);
        }

        // Handle canonicity
        if high.is_negated() {
            return Ok(-self.mk_node(v, -low, -high)?);
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        })?;
        Ok(Ref::positive(i as u32))
    }

    pub fn mk_var(&self, v: u32) -> Result<Ref, SolverError> {
        self.mk_node(v, self.zero, self.one)
    }

    fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || v < self.variable(node) {
            return (node, node);
        }
        debug_assert_eq!(v, self.variable(node));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref, SolverError> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return Ok(g);
        }
        if self.is_zero(f) {
            return Ok(h);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero
        } else {
            g
        };
        let h = if h == f {
            self.zero
        } else if h == -f {
            self.one
        } else {
            h
        };

        // Terminal cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return Ok(g);
        }
        if self.is_one(g) && self.is_zero(h) {
            return Ok(f);
        }
        if self.is_zero(g) && self.is_one(h) {
            return Ok(-f);
        }

        // Equivalent pairs, keep the lowest variable first:
        //   ite(F,1,H) == ite(H,1,F) == F ∨ H
        //   ite(F,G,0) == ite(G,F,0) == F ∧ G
        let (f, g, h) = if self.is_one(g) && self.variable(h) < self.variable(f) {
            (h, self.one, f)
        } else if self.is_zero(h) && self.variable(g) < self.variable(f) {
            (g, f, self.zero)
        } else {
            (f, g, h)
        };

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };

        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, negate) = if g.is_negated() {
            (-g, -h, true)
        } else {
            (g, h, false)
        };

        let key = IteKey(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            debug!("cache: {:?} -> {}", key, res);
            return Ok(if negate { -res } else { res });
        }

        // Determine the top variable:
        let m = [f, g, h]
            .into_iter()
            .filter(|&node| !self.is_terminal(node))
            .map(|node| self.variable(node))
            .min()
            .unwrap_or(0);
        debug_assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0)?;
        let t = self.apply_ite(f1, g1, h1)?;

        let res = self.mk_node(m, e, t)?;
        debug!("computed: {:?} -> {}", key, res);
        self.cache.borrow_mut().insert(key, res);

        Ok(if negate { -res } else { res })
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Result<Ref, SolverError> {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Result<Ref, SolverError> {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Result<Ref, SolverError> {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Result<Ref, SolverError> {
        self.apply_ite(u, v, self.one)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref, SolverError> {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node)?;
            if self.is_zero(res) {
                break;
            }
        }
        Ok(res)
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref, SolverError> {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node)?;
            if self.is_one(res) {
                break;
            }
        }
        Ok(res)
    }

    /// Number of distinct nodes reachable from `f`, the terminal included.
    pub fn size(&self, f: Ref) -> u64 {
        let mut visited = HashSet::new();
        let mut stack = vec![f.index()];
        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            let node = *self.storage.borrow().value(index);
            if !node.is_terminal() {
                stack.push(node.low.index());
                stack.push(node.high.index());
            }
        }
        visited.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_var() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();
        assert_eq!(bdd.variable(x), 1);
        assert_eq!(bdd.low_node(x), bdd.zero);
        assert_eq!(bdd.high_node(x), bdd.one);
        assert_eq!(bdd.mk_var(1).unwrap(), x);
    }

    #[test]
    fn test_not_var() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();
        let not_x = bdd.apply_not(x);
        assert_eq!(bdd.low_node(not_x), bdd.one);
        assert_eq!(bdd.high_node(not_x), bdd.zero);
    }

    #[test]
    fn test_terminal() {
        let bdd = Bdd::default();
        assert!(bdd.is_one(bdd.one));
        assert!(bdd.is_zero(bdd.zero));
        assert_eq!(-bdd.one, bdd.zero);
        assert_eq!(bdd.size(bdd.one), 1);
    }

    #[test]
    fn test_de_morgan_and() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();
        let lhs = -bdd.apply_and(x, y).unwrap();
        let rhs = bdd.apply_or(-x, -y).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_de_morgan_or() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();
        let lhs = -bdd.apply_or(x, y).unwrap();
        let rhs = bdd.apply_and(-x, -y).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_implication_and_equivalence() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();

        let imp = bdd.apply_imply(x, y).unwrap();
        assert_eq!(imp, bdd.apply_or(-x, y).unwrap());

        let eq = bdd.apply_eq(x, y).unwrap();
        let both = bdd.apply_and(imp, bdd.apply_imply(y, x).unwrap()).unwrap();
        assert_eq!(eq, both);
        assert_eq!(bdd.apply_eq(x, x).unwrap(), bdd.one);
        assert_eq!(bdd.apply_eq(x, -x).unwrap(), bdd.zero);
    }

    #[test]
    fn test_apply_ite() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();
        let z = bdd.mk_var(3).unwrap();
        let f = bdd.apply_ite(x, y, z).unwrap();
        assert_eq!(f, bdd.mk_node(1, z, y).unwrap());
        let x_and_y = bdd.apply_and(x, y).unwrap();
        let not_x_and_z = bdd.apply_and(-x, z).unwrap();
        assert_eq!(f, bdd.apply_or(x_and_y, not_x_and_z).unwrap());
    }

    #[test]
    fn test_contradiction() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();
        let f = bdd.apply_and_many([x, y, -x]).unwrap();
        assert!(bdd.is_zero(f));
        let g = bdd.apply_or_many([x, -y, y]).unwrap();
        assert!(bdd.is_one(g));
    }

    #[test]
    fn test_node_limit() {
        let bdd = Bdd::with_config(BddConfig::default().with_storage_bits(2).with_max_nodes(3));
        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();
        assert_eq!(bdd.apply_and(x, y), Err(SolverError::NodeLimit { limit: 3 }));
    }
}
