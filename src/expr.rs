//! Cross-tree constraint expressions.
//!
//! The operator set is closed and every operator has a fixed arity, so once
//! an [`Expr`] exists there is nothing left to validate: compiling it is a
//! total, exhaustive match. All checking happens in [`Expr::from_decl`].

use std::collections::BTreeSet;

use crate::error::ModelError;
use crate::feature::FeatureId;
use crate::source::ConstraintDecl;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Expr {
    Var(FeatureId),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Equiv(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var(feature: FeatureId) -> Self {
        Expr::Var(feature)
    }

    pub fn not(value: Self) -> Self {
        Expr::Not(Box::new(value))
    }

    pub fn and(lhs: Self, rhs: Self) -> Self {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Self, rhs: Self) -> Self {
        Expr::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn implies(lhs: Self, rhs: Self) -> Self {
        Expr::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn equiv(lhs: Self, rhs: Self) -> Self {
        Expr::Equiv(Box::new(lhs), Box::new(rhs))
    }

    /// Check a declared constraint and resolve its variable names.
    ///
    /// Unknown operator tags are [`ModelError::UnknownOperator`]; a known
    /// operator with the wrong number of operands, a `var` without a name, or
    /// a name that `resolve` does not know is [`ModelError::StructuralError`].
    pub fn from_decl<F>(decl: &ConstraintDecl, resolve: &F) -> Result<Self, ModelError>
    where
        F: Fn(&str) -> Option<FeatureId>,
    {
        let arity = decl.operands.len();
        let expected = match decl.op.as_str() {
            "var" => 0,
            "not" => 1,
            "and" | "conj" | "or" | "disj" | "implies" | "imp" | "equiv" | "eq" => 2,
            _ => {
                return Err(ModelError::UnknownOperator {
                    op: decl.op.clone(),
                    arity,
                })
            }
        };
        if arity != expected {
            return Err(ModelError::structural(format!(
                "operator `{}` takes {} operand(s), found {}",
                decl.op, expected, arity
            )));
        }

        let operand = |i: usize| Self::from_decl(&decl.operands[i], resolve);
        let expr = match decl.op.as_str() {
            "var" => {
                let name = decl
                    .name
                    .as_deref()
                    .ok_or_else(|| ModelError::structural("`var` without a feature name"))?;
                let feature = resolve(name).ok_or_else(|| {
                    ModelError::structural(format!("constraint refers to unknown feature `{}`", name))
                })?;
                Expr::Var(feature)
            }
            "not" => Expr::not(operand(0)?),
            "and" | "conj" => Expr::and(operand(0)?, operand(1)?),
            "or" | "disj" => Expr::or(operand(0)?, operand(1)?),
            "implies" | "imp" => Expr::implies(operand(0)?, operand(1)?),
            _ => Expr::equiv(operand(0)?, operand(1)?),
        };
        Ok(expr)
    }

    /// Truth value under a total assignment.
    pub fn eval<F>(&self, value: &F) -> bool
    where
        F: Fn(FeatureId) -> bool,
    {
        match self {
            Expr::Var(feature) => value(*feature),
            Expr::Not(a) => !a.eval(value),
            Expr::And(a, b) => a.eval(value) && b.eval(value),
            Expr::Or(a, b) => a.eval(value) || b.eval(value),
            Expr::Implies(a, b) => !a.eval(value) || b.eval(value),
            Expr::Equiv(a, b) => a.eval(value) == b.eval(value),
        }
    }

    /// Features mentioned in the expression.
    pub fn features(&self) -> BTreeSet<FeatureId> {
        let mut result = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::Var(feature) => {
                    result.insert(*feature);
                }
                Expr::Not(a) => stack.push(a),
                Expr::And(a, b) | Expr::Or(a, b) | Expr::Implies(a, b) | Expr::Equiv(a, b) => {
                    stack.push(a);
                    stack.push(b);
                }
            }
        }
        result
    }
}
