//! One step of an interactive configuration session.
//!
//! A [`ConfigurationState`] is a value: the user's manual decisions, plus
//! the activation, deactivation and validity they imply. The implied parts
//! are computed on first use and then frozen. Edits never touch an existing
//! state; they return the next one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use log::debug;

use crate::engine::assumption_literals;
use crate::error::ConfigurationError;
use crate::feature::{Feature, FeatureId};
use crate::model::FeatureModel;
use crate::types::Lit;

/// Tri-state shown for a feature.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FeatureState {
    /// Selected by the user or activated.
    Enabled,
    /// Deselected by the user or deactivated.
    Disabled,
    Undetermined,
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FeatureState::Enabled => "enabled",
            FeatureState::Disabled => "disabled",
            FeatureState::Undetermined => "undetermined",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Default)]
struct Derived {
    activated: BTreeSet<FeatureId>,
    deactivated: BTreeSet<FeatureId>,
}

#[derive(Clone)]
pub struct ConfigurationState {
    model: Arc<FeatureModel>,
    selected: BTreeSet<FeatureId>,
    deselected: BTreeSet<FeatureId>,
    values: BTreeMap<FeatureId, String>,
    valid: OnceLock<bool>,
    derived: OnceLock<Derived>,
}

impl fmt::Debug for ConfigurationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |set: &BTreeSet<FeatureId>| {
            set.iter()
                .map(|&id| match self.model.tree().get(id) {
                    Some(feature) => feature.name().to_string(),
                    None => id.to_string(),
                })
                .collect::<Vec<_>>()
        };
        let mut s = f.debug_struct("ConfigurationState");
        s.field("selected", &names(&self.selected))
            .field("deselected", &names(&self.deselected));
        if let Some(derived) = self.derived.get() {
            s.field("activated", &names(&derived.activated))
                .field("deactivated", &names(&derived.deactivated));
        }
        if let Some(valid) = self.valid.get() {
            s.field("valid", valid);
        }
        s.finish()
    }
}

impl ConfigurationState {
    pub fn new(model: Arc<FeatureModel>) -> Self {
        Self::from_parts(model, BTreeSet::new(), BTreeSet::new(), BTreeMap::new())
    }

    /// A state with the given manual decisions.
    ///
    /// A feature listed both as selected and deselected ends up deselected.
    /// Ids that do not belong to `model` are rejected.
    pub fn from_manual(
        model: Arc<FeatureModel>,
        selected: impl IntoIterator<Item = FeatureId>,
        deselected: impl IntoIterator<Item = FeatureId>,
    ) -> Result<Self, ConfigurationError> {
        let mut selected: BTreeSet<FeatureId> = selected.into_iter().collect();
        let deselected: BTreeSet<FeatureId> = deselected.into_iter().collect();
        for &feature in selected.iter().chain(&deselected) {
            lookup(&model, feature)?;
        }
        selected.retain(|f| !deselected.contains(f));
        Ok(Self::from_parts(model, selected, deselected, BTreeMap::new()))
    }

    pub(crate) fn from_parts(
        model: Arc<FeatureModel>,
        selected: BTreeSet<FeatureId>,
        deselected: BTreeSet<FeatureId>,
        values: BTreeMap<FeatureId, String>,
    ) -> Self {
        debug_assert!(selected.is_disjoint(&deselected));
        Self {
            model,
            selected,
            deselected,
            values,
            valid: OnceLock::new(),
            derived: OnceLock::new(),
        }
    }

    fn edited(
        &self,
        feature: FeatureId,
        edit: impl FnOnce(&mut BTreeSet<FeatureId>, &mut BTreeSet<FeatureId>),
    ) -> Result<Self, ConfigurationError> {
        lookup(&self.model, feature)?;
        let mut selected = self.selected.clone();
        let mut deselected = self.deselected.clone();
        edit(&mut selected, &mut deselected);
        Ok(Self::from_parts(
            Arc::clone(&self.model),
            selected,
            deselected,
            self.values.clone(),
        ))
    }

    pub fn model(&self) -> &Arc<FeatureModel> {
        &self.model
    }

    /// Manually selected features.
    pub fn selected(&self) -> &BTreeSet<FeatureId> {
        &self.selected
    }

    /// Manually deselected features.
    pub fn deselected(&self) -> &BTreeSet<FeatureId> {
        &self.deselected
    }

    fn assumptions(&self) -> Vec<Lit> {
        assumption_literals(&self.selected, &self.deselected)
    }
}

/// The feature behind `id`, if `id` belongs to `model`.
fn lookup(model: &FeatureModel, id: FeatureId) -> Result<&Feature, ConfigurationError> {
    model
        .tree()
        .get(id)
        .ok_or_else(|| ConfigurationError::UnknownFeature(id.to_string()))
}

// Edits. Each one fails with `UnknownFeature` on an id from another model.
impl ConfigurationState {
    pub fn with_selection(&self, feature: FeatureId) -> Result<Self, ConfigurationError> {
        self.edited(feature, |selected, deselected| {
            deselected.remove(&feature);
            selected.insert(feature);
        })
    }

    pub fn with_deselection(&self, feature: FeatureId) -> Result<Self, ConfigurationError> {
        self.edited(feature, |selected, deselected| {
            selected.remove(&feature);
            deselected.insert(feature);
        })
    }

    /// Drop any manual decision about `feature`.
    pub fn with_reset(&self, feature: FeatureId) -> Result<Self, ConfigurationError> {
        self.edited(feature, |selected, deselected| {
            selected.remove(&feature);
            deselected.remove(&feature);
        })
    }

    /// Override the value of a valued feature.
    pub fn with_value(&self, feature: FeatureId, value: impl Into<String>) -> Result<Self, ConfigurationError> {
        let f = lookup(&self.model, feature)?;
        if !f.has_value() {
            return Err(ConfigurationError::NoValue(f.name().to_string()));
        }
        let mut values = self.values.clone();
        values.insert(feature, value.into());
        Ok(Self::from_parts(
            Arc::clone(&self.model),
            self.selected.clone(),
            self.deselected.clone(),
            values,
        ))
    }

    /// Current value of a valued feature: the override if any, else the
    /// default from the model.
    pub fn value(&self, feature: FeatureId) -> Option<&str> {
        self.values
            .get(&feature)
            .map(String::as_str)
            .or_else(|| self.model.tree().get(feature)?.value())
    }
}

// Derived properties.
impl ConfigurationState {
    pub fn is_valid(&self) -> bool {
        *self.valid.get_or_init(|| {
            let valid = self.model.engine().is_valid(&self.assumptions());
            debug!("configuration valid: {}", valid);
            valid
        })
    }

    fn derived(&self) -> &Derived {
        self.derived.get_or_init(|| self.compute_derived())
    }

    /// One pass over all features, classifying every undecided one.
    ///
    /// A feature that is forced true is never tested for being forced
    /// false, so the two sets are disjoint even when the manual decisions are
    /// contradictory (then every undecided feature counts as activated).
    /// When the decisions are consistent, a single model tells which of the
    /// two tests can possibly succeed, so each feature costs one query.
    fn compute_derived(&self) -> Derived {
        let engine = self.model.engine();
        let tree = self.model.tree();
        let undecided = tree.feature_ids().filter(|&f| !self.is_manual(f));

        let assumptions = self.assumptions();
        let witness = engine.witness(&assumptions);
        // Already set if `is_valid` ran first; both agree.
        let _ = self.valid.set(witness.is_some());
        let Some(witness) = witness else {
            let activated: BTreeSet<FeatureId> = undecided.collect();
            debug!("inconsistent decisions: {} features activated", activated.len());
            return Derived {
                activated,
                deactivated: BTreeSet::new(),
            };
        };

        let mut derived = Derived::default();
        for feature in undecided {
            let in_witness = witness[feature.index()].is_positive();
            if in_witness {
                if engine.is_forced_true(feature, &assumptions) {
                    derived.activated.insert(feature);
                }
            } else if engine.is_forced_false(feature, &assumptions) {
                derived.deactivated.insert(feature);
            }
        }
        debug!(
            "derived: {} activated, {} deactivated",
            derived.activated.len(),
            derived.deactivated.len()
        );
        derived
    }

    /// Features forced true by the manual decisions, manual ones excluded.
    pub fn activated_features(&self) -> &BTreeSet<FeatureId> {
        &self.derived().activated
    }

    /// Features forced false by the manual decisions, manual ones excluded.
    pub fn deactivated_features(&self) -> &BTreeSet<FeatureId> {
        &self.derived().deactivated
    }

    pub fn is_selected(&self, feature: FeatureId) -> bool {
        self.selected.contains(&feature)
    }

    pub fn is_deselected(&self, feature: FeatureId) -> bool {
        self.deselected.contains(&feature)
    }

    pub fn is_activated(&self, feature: FeatureId) -> bool {
        self.activated_features().contains(&feature)
    }

    pub fn is_deactivated(&self, feature: FeatureId) -> bool {
        self.deactivated_features().contains(&feature)
    }

    pub fn is_enabled(&self, feature: FeatureId) -> bool {
        self.is_selected(feature) || self.is_activated(feature)
    }

    pub fn is_disabled(&self, feature: FeatureId) -> bool {
        self.is_deselected(feature) || self.is_deactivated(feature)
    }

    pub fn is_automatic(&self, feature: FeatureId) -> bool {
        self.is_activated(feature) || self.is_deactivated(feature)
    }

    pub fn is_manual(&self, feature: FeatureId) -> bool {
        self.is_selected(feature) || self.is_deselected(feature)
    }

    /// The control of an automatic feature is read-only.
    pub fn is_locked(&self, feature: FeatureId) -> bool {
        !self.is_manual(feature) && self.is_automatic(feature)
    }

    pub fn state(&self, feature: FeatureId) -> FeatureState {
        if self.is_enabled(feature) {
            FeatureState::Enabled
        } else if self.is_disabled(feature) {
            FeatureState::Disabled
        } else {
            FeatureState::Undetermined
        }
    }

    /// Every feature is decided, manually or automatically, and the
    /// decisions are consistent.
    pub fn is_complete(&self) -> bool {
        self.model
            .tree()
            .feature_ids()
            .all(|f| self.is_manual(f) || self.is_automatic(f))
            && self.is_valid()
    }
}
