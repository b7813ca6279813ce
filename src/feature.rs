use std::fmt;

use crate::types::Var;

/// Index of a feature in its tree's arena.
///
/// Ids are assigned in pre-order, so the root is always `FeatureId(0)` and
/// every parent precedes its children.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FeatureId(pub(crate) usize);

impl FeatureId {
    pub fn index(self) -> usize {
        self.0
    }

    /// The decision variable standing for this feature.
    pub fn var(self) -> Var {
        Var::new(self.0 as u32 + 1)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the children of a feature are grouped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GroupType {
    /// Leaf feature.
    None,
    /// Each child is mandatory or optional on its own.
    And,
    /// At least one child when the parent is selected.
    Or,
    /// Exactly one child when the parent is selected.
    Alternative,
}

impl GroupType {
    /// Parse a group tag of a feature declaration.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "none" | "feature" => Some(GroupType::None),
            "and" => Some(GroupType::And),
            "or" => Some(GroupType::Or),
            "alt" | "alternative" => Some(GroupType::Alternative),
            _ => None,
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            GroupType::None => "none",
            GroupType::And => "and",
            GroupType::Or => "or",
            GroupType::Alternative => "alt",
        };
        f.write_str(tag)
    }
}

/// A node of a [`FeatureTree`][crate::tree::FeatureTree].
///
/// Parent and children are arena indices, so a feature never owns another
/// feature and looking up the parent always yields the canonical node.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Feature {
    pub(crate) id: FeatureId,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) mandatory: bool,
    pub(crate) group: GroupType,
    pub(crate) value: Option<String>,
    pub(crate) parent: Option<FeatureId>,
    pub(crate) children: Vec<FeatureId>,
}

impl Feature {
    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the feature is forced together with its parent.
    ///
    /// Always `false` for the root, which is selected unconditionally.
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn group(&self) -> GroupType {
        self.group
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Default value of a valued feature.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn parent(&self) -> Option<FeatureId> {
        self.parent
    }

    pub fn children(&self) -> &[FeatureId] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_tags() {
        assert_eq!(GroupType::from_tag("feature"), Some(GroupType::None));
        assert_eq!(GroupType::from_tag("and"), Some(GroupType::And));
        assert_eq!(GroupType::from_tag("or"), Some(GroupType::Or));
        assert_eq!(GroupType::from_tag("alt"), Some(GroupType::Alternative));
        assert_eq!(GroupType::from_tag("alternative"), Some(GroupType::Alternative));
        assert_eq!(GroupType::from_tag("xor"), None);
        assert_eq!(GroupType::Alternative.to_string(), "alt");
    }

    #[test]
    fn test_feature_var_is_one_based() {
        assert_eq!(FeatureId(0).var().id(), 1);
        assert_eq!(FeatureId(4).var().id(), 5);
    }
}
