//! Compilation of a feature tree into one propositional formula.
//!
//! Every feature contributes the clauses of its tree semantics:
//!
//! ```text
//! root R                         R
//! mandatory child C of P         C <-> P
//! optional child C of P          C -> P
//! alternative group P{C1..Cn}    (P <-> C1 | .. | Cn) & !(Ci & Cj) for i < j
//! or group P{C1..Cn}             P <-> C1 | .. | Cn
//! ```
//!
//! and every cross-tree constraint contributes itself. The conjunction of
//! all of them is built in a [`Bdd`] manager and then frozen: a [`Formula`]
//! is a plain node array that is never mutated again and can be shared
//! between threads as is.

use std::fmt::Debug;

use log::{debug, info};

use crate::bdd::{Bdd, BddConfig};
use crate::error::SolverError;
use crate::expr::Expr;
use crate::feature::{Feature, GroupType};
use crate::node::Node;
use crate::reference::Ref;
use crate::tree::FeatureTree;

/// Compiled, immutable propositional theory of a feature model.
///
/// Variable `k + 1` stands for the feature with id `k`.
#[derive(Clone)]
pub struct Formula {
    nodes: Vec<Node>,
    root: Ref,
    num_vars: usize,
    num_clauses: usize,
}

impl Debug for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formula")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("num_vars", &self.num_vars)
            .field("num_clauses", &self.num_clauses)
            .finish()
    }
}

/// Compile `tree` with the default manager configuration.
pub fn compile(tree: &FeatureTree) -> Result<Formula, SolverError> {
    compile_with_config(tree, &BddConfig::default())
}

/// Compile `tree`, failing if the diagram outgrows `config.max_nodes`.
pub fn compile_with_config(tree: &FeatureTree, config: &BddConfig) -> Result<Formula, SolverError> {
    let bdd = Bdd::with_config(*config);

    let mut clauses = Vec::new();
    for feature in tree.features() {
        feature_clauses(&bdd, tree, feature, &mut clauses)?;
    }
    let tree_clauses = clauses.len();
    for constraint in tree.constraints() {
        clauses.push(compile_expr(&bdd, constraint)?);
    }
    debug!(
        "compile: {} tree clauses, {} cross-tree clauses",
        tree_clauses,
        clauses.len() - tree_clauses
    );

    let num_clauses = clauses.len();
    let root = bdd.apply_and_many(clauses)?;
    info!(
        "Compiled formula over {} variables: {} clauses, {} nodes ({:?})",
        tree.len(),
        num_clauses,
        bdd.size(root),
        bdd
    );

    Ok(Formula {
        nodes: bdd.nodes(),
        root,
        num_vars: tree.len(),
        num_clauses,
    })
}

fn feature_clauses(
    bdd: &Bdd,
    tree: &FeatureTree,
    feature: &Feature,
    clauses: &mut Vec<Ref>,
) -> Result<(), SolverError> {
    let f = bdd.mk_var(feature.id().var().id())?;

    match feature.parent() {
        None => clauses.push(f),
        Some(parent) => {
            let p = bdd.mk_var(parent.var().id())?;
            if feature.is_mandatory() {
                clauses.push(bdd.apply_eq(f, p)?);
            } else {
                clauses.push(bdd.apply_imply(f, p)?);
            }
        }
    }

    let children = tree
        .children(feature.id())
        .map(|child| bdd.mk_var(child.id().var().id()))
        .collect::<Result<Vec<_>, _>>()?;

    match feature.group() {
        GroupType::None | GroupType::And => {}
        GroupType::Or => {
            let any = bdd.apply_or_many(children.iter().copied())?;
            clauses.push(bdd.apply_eq(f, any)?);
        }
        GroupType::Alternative => {
            let any = bdd.apply_or_many(children.iter().copied())?;
            clauses.push(bdd.apply_eq(f, any)?);
            for (i, &ci) in children.iter().enumerate() {
                for &cj in &children[i + 1..] {
                    clauses.push(-bdd.apply_and(ci, cj)?);
                }
            }
        }
    }
    Ok(())
}

fn compile_expr(bdd: &Bdd, expr: &Expr) -> Result<Ref, SolverError> {
    match expr {
        Expr::Var(feature) => bdd.mk_var(feature.var().id()),
        Expr::Not(a) => Ok(bdd.apply_not(compile_expr(bdd, a)?)),
        Expr::And(a, b) => bdd.apply_and(compile_expr(bdd, a)?, compile_expr(bdd, b)?),
        Expr::Or(a, b) => bdd.apply_or(compile_expr(bdd, a)?, compile_expr(bdd, b)?),
        Expr::Implies(a, b) => bdd.apply_imply(compile_expr(bdd, a)?, compile_expr(bdd, b)?),
        Expr::Equiv(a, b) => bdd.apply_eq(compile_expr(bdd, a)?, compile_expr(bdd, b)?),
    }
}

impl Formula {
    pub fn root(&self) -> Ref {
        self.root
    }

    /// Number of variables, one per feature.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn num_clauses(&self) -> usize {
        self.num_clauses
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == -Ref::positive(1)
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == Ref::positive(1)
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == 1
    }

    pub fn variable(&self, node: Ref) -> u32 {
        self.nodes[node.index()].variable
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.nodes[node.index()].low;
        if node.is_negated() {
            -low
        } else {
            low
        }
    }

    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.nodes[node.index()].high;
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    /// Number of distinct nodes reachable from the root, the terminal included.
    pub fn size(&self) -> usize {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![self.root.index()];
        let mut count = 0;
        while let Some(index) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            count += 1;
            let node = &self.nodes[index];
            if !node.is_terminal() {
                stack.push(node.low.index());
                stack.push(node.high.index());
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::feature::FeatureId;
    use crate::source::{ConstraintDecl, FeatureDecl, ModelSource};

    fn tree(source: &ModelSource) -> FeatureTree {
        FeatureTree::build(source).unwrap()
    }

    /// Brute-force truth value of the tree semantics plus constraints.
    fn expected(tree: &FeatureTree, assignment: &[bool]) -> bool {
        let value = |f: FeatureId| assignment[f.index()];
        tree.features().all(|feature| {
            let f = value(feature.id());
            let parent_ok = match feature.parent() {
                None => f,
                Some(p) if feature.is_mandatory() => f == value(p),
                Some(p) => !f || value(p),
            };
            let selected = feature.children().iter().filter(|&&c| value(c)).count();
            let group_ok = match feature.group() {
                GroupType::None | GroupType::And => true,
                GroupType::Or => f == (selected >= 1),
                GroupType::Alternative => f == (selected >= 1) && selected <= 1,
            };
            parent_ok && group_ok
        }) && tree.constraints().iter().all(|c| c.eval(&value))
    }

    fn check_against_brute_force(source: &ModelSource) {
        let tree = tree(source);
        let formula = compile(&tree).unwrap();
        let n = tree.len();
        for bits in 0..(1u32 << n) {
            let assignment: Vec<bool> = (0..n).map(|i| bits & (1 << i) != 0).collect();
            let lits: Vec<_> = tree
                .feature_ids()
                .map(|f| if assignment[f.index()] { f.var().pos() } else { f.var().neg() })
                .collect();
            assert_eq!(
                formula.satisfiable(&lits),
                expected(&tree, &assignment),
                "assignment {:?}",
                assignment
            );
        }
    }

    #[test]
    fn test_root_is_forced() {
        let tree = tree(&ModelSource::new(FeatureDecl::new("R")));
        let formula = compile(&tree).unwrap();
        assert_eq!(formula.num_clauses(), 1);
        let r = tree.root().id().var();
        assert!(formula.satisfiable(&[r.pos()]));
        assert!(!formula.satisfiable(&[r.neg()]));
    }

    #[test]
    fn test_groups_match_brute_force() {
        let source = ModelSource::new(
            FeatureDecl::new("R")
                .group("and")
                .child(
                    FeatureDecl::new("Alt")
                        .group("alt")
                        .child(FeatureDecl::new("A1"))
                        .child(FeatureDecl::new("A2"))
                        .child(FeatureDecl::new("A3")),
                )
                .child(
                    FeatureDecl::new("Or")
                        .mandatory()
                        .group("or")
                        .child(FeatureDecl::new("O1"))
                        .child(FeatureDecl::new("O2")),
                ),
        );
        check_against_brute_force(&source);
    }

    #[test]
    fn test_constraints_match_brute_force() {
        let source = ModelSource::new(
            FeatureDecl::new("R")
                .group("and")
                .child(FeatureDecl::new("A"))
                .child(FeatureDecl::new("B"))
                .child(FeatureDecl::new("C").mandatory())
                .child(FeatureDecl::new("D")),
        )
        .constraint(ConstraintDecl::equiv(
            ConstraintDecl::var("A"),
            ConstraintDecl::not(ConstraintDecl::var("B")),
        ))
        .constraint(ConstraintDecl::implies(
            ConstraintDecl::or(ConstraintDecl::var("A"), ConstraintDecl::var("D")),
            ConstraintDecl::and(ConstraintDecl::var("C"), ConstraintDecl::var("R")),
        ));
        check_against_brute_force(&source);
    }

    #[test]
    fn test_node_limit_is_reported() {
        let mut root = FeatureDecl::new("R").group("or");
        for i in 0..12 {
            root = root.child(FeatureDecl::new(format!("F{}", i)));
        }
        let tree = tree(&ModelSource::new(root));
        let config = BddConfig::default().with_max_nodes(8);
        assert_eq!(
            compile_with_config(&tree, &config).unwrap_err(),
            SolverError::NodeLimit { limit: 8 }
        );
    }
}
