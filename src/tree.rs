//! The feature tree.
//!
//! Features live in one arena in pre-order, root first. Relations between
//! features are arena indices ([`FeatureId`]), so the tree has no reference
//! cycles and any two lookups of the same feature yield the same node.
//! The tree is read-only once built.

use std::collections::HashMap;
use std::ops::Index;

use log::{debug, info};

use crate::error::ModelError;
use crate::expr::Expr;
use crate::feature::{Feature, FeatureId, GroupType};
use crate::source::{FeatureDecl, ModelSource};

#[derive(Debug, Clone)]
pub struct FeatureTree {
    features: Vec<Feature>,
    by_name: HashMap<String, FeatureId>,
    constraints: Vec<Expr>,
}

impl FeatureTree {
    /// Validate a model declaration and materialise it.
    ///
    /// Fails if the source does not have exactly one root, if a feature name
    /// is empty or used twice, if a group tag is not recognised, if an `or`
    /// or `alt` group has no children, or if a cross-tree constraint is
    /// malformed (see [`Expr::from_decl`]).
    pub fn build(source: &ModelSource) -> Result<Self, ModelError> {
        let root = match source.roots.as_slice() {
            [root] => root,
            roots => {
                return Err(ModelError::structural(format!(
                    "model must have exactly one root, found {}",
                    roots.len()
                )))
            }
        };

        let mut tree = FeatureTree {
            features: Vec::new(),
            by_name: HashMap::new(),
            constraints: Vec::new(),
        };
        tree.add_feature(root, None)?;

        let constraints = source
            .constraints
            .iter()
            .map(|decl| Expr::from_decl(decl, &|name: &str| tree.id(name)))
            .collect::<Result<Vec<_>, _>>()?;
        for (i, constraint) in constraints.iter().enumerate() {
            let names: Vec<&str> = constraint
                .features()
                .into_iter()
                .map(|id| tree.features[id.index()].name())
                .collect();
            debug!("constraint #{} over {:?}", i, names);
        }
        tree.constraints = constraints;

        info!(
            "Built feature tree with {} features and {} cross-tree constraints",
            tree.len(),
            tree.constraints.len()
        );
        Ok(tree)
    }

    fn add_feature(&mut self, decl: &FeatureDecl, parent: Option<FeatureId>) -> Result<FeatureId, ModelError> {
        if decl.name.is_empty() {
            return Err(ModelError::structural("feature with an empty name"));
        }
        let id = FeatureId(self.features.len());
        if self.by_name.insert(decl.name.clone(), id).is_some() {
            return Err(ModelError::structural(format!("duplicate feature name `{}`", decl.name)));
        }

        let group = match decl.group.as_deref() {
            None => GroupType::None,
            Some(tag) => GroupType::from_tag(tag).ok_or_else(|| {
                ModelError::structural(format!("feature `{}` has unknown group tag `{}`", decl.name, tag))
            })?,
        };
        let group = match group {
            GroupType::None if !decl.children.is_empty() => GroupType::And,
            GroupType::Or | GroupType::Alternative if decl.children.is_empty() => {
                return Err(ModelError::structural(format!(
                    "feature `{}` declares an `{}` group without children",
                    decl.name, group
                )));
            }
            group => group,
        };
        debug!("feature {} `{}`: group = {}, parent = {:?}", id, decl.name, group, parent);

        self.features.push(Feature {
            id,
            name: decl.name.clone(),
            description: decl.description.as_deref().and_then(normalize_description),
            mandatory: parent.is_some() && decl.mandatory,
            group,
            value: decl.value.clone(),
            parent,
            children: Vec::new(),
        });

        let children = decl
            .children
            .iter()
            .map(|child| self.add_feature(child, Some(id)))
            .collect::<Result<Vec<_>, _>>()?;
        self.features[id.0].children = children;

        Ok(id)
    }
}

/// Trim every line and the text as a whole; blank descriptions are dropped.
fn normalize_description(text: &str) -> Option<String> {
    let text = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

impl FeatureTree {
    pub fn root(&self) -> &Feature {
        &self.features[0]
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// A built tree always has a root, so it is never empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// All features in pre-order, root first.
    pub fn features(&self) -> impl Iterator<Item = &Feature> + '_ {
        self.features.iter()
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        (0..self.features.len()).map(FeatureId)
    }

    pub fn feature(&self, id: FeatureId) -> &Feature {
        &self.features[id.0]
    }

    /// Like [`feature`][Self::feature], but `None` for an id out of range.
    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.0)
    }

    pub fn get_feature(&self, name: &str) -> Option<&Feature> {
        self.id(name).map(|id| self.feature(id))
    }

    pub fn id(&self, name: &str) -> Option<FeatureId> {
        self.by_name.get(name).copied()
    }

    pub fn parent(&self, id: FeatureId) -> Option<&Feature> {
        self.feature(id).parent.map(|parent| self.feature(parent))
    }

    pub fn children(&self, id: FeatureId) -> impl Iterator<Item = &Feature> + '_ {
        self.feature(id).children.iter().map(|&child| self.feature(child))
    }

    pub fn constraints(&self) -> &[Expr] {
        &self.constraints
    }
}

impl Index<FeatureId> for FeatureTree {
    type Output = Feature;

    fn index(&self, id: FeatureId) -> &Self::Output {
        self.feature(id)
    }
}
