//! Untyped model declarations, as delivered by an external parser.
//!
//! Nothing here is validated: tags are plain strings and operand lists
//! have arbitrary length. [`FeatureTree::build`][crate::tree::FeatureTree::build]
//! turns a [`ModelSource`] into a checked tree or rejects it.
//!
//! The types derive `serde` traits, so a model can be read from JSON:
//!
//! ```json
//! {
//!   "roots": [{
//!     "name": "R", "group": "and",
//!     "children": [
//!       { "name": "G", "mandatory": true, "group": "alt",
//!         "children": [{ "name": "A" }, { "name": "B" }] },
//!       { "name": "C" }
//!     ]
//!   }],
//!   "constraints": [
//!     { "op": "imp", "operands": [{ "op": "var", "name": "A" }, { "op": "var", "name": "C" }] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSource {
    #[serde(default)]
    pub roots: Vec<FeatureDecl>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDecl>,
}

impl ModelSource {
    pub fn new(root: FeatureDecl) -> Self {
        Self {
            roots: vec![root],
            constraints: Vec::new(),
        }
    }

    pub fn constraint(mut self, constraint: ConstraintDecl) -> Self {
        self.constraints.push(constraint);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FeatureDecl>,
}

impl FeatureDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn group(mut self, tag: impl Into<String>) -> Self {
        self.group = Some(tag.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn child(mut self, child: FeatureDecl) -> Self {
        self.children.push(child);
        self
    }
}

/// One node of a cross-tree constraint, e.g. `{"op": "not", "operands": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDecl {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operands: Vec<ConstraintDecl>,
}

impl ConstraintDecl {
    pub fn op(op: impl Into<String>, operands: Vec<ConstraintDecl>) -> Self {
        Self {
            op: op.into(),
            name: None,
            operands,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self {
            op: "var".to_string(),
            name: Some(name.into()),
            operands: Vec::new(),
        }
    }

    pub fn not(operand: ConstraintDecl) -> Self {
        Self::op("not", vec![operand])
    }

    pub fn and(lhs: ConstraintDecl, rhs: ConstraintDecl) -> Self {
        Self::op("and", vec![lhs, rhs])
    }

    pub fn or(lhs: ConstraintDecl, rhs: ConstraintDecl) -> Self {
        Self::op("or", vec![lhs, rhs])
    }

    pub fn implies(lhs: ConstraintDecl, rhs: ConstraintDecl) -> Self {
        Self::op("implies", vec![lhs, rhs])
    }

    pub fn equiv(lhs: ConstraintDecl, rhs: ConstraintDecl) -> Self {
        Self::op("equiv", vec![lhs, rhs])
    }
}
