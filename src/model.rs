//! A loaded feature model: the tree together with its compiled engine.

use std::sync::Arc;

use log::info;

use crate::bdd::BddConfig;
use crate::configuration::ConfigurationState;
use crate::engine::SatEngine;
use crate::error::{ConfigurationError, ModelError};
use crate::feature::FeatureId;
use crate::formula::compile_with_config;
use crate::source::ModelSource;
use crate::tree::FeatureTree;

/// Immutable for the lifetime of the process; configurations share it
/// through an [`Arc`].
#[derive(Debug)]
pub struct FeatureModel {
    tree: FeatureTree,
    engine: SatEngine,
}

impl FeatureModel {
    /// Build the tree and compile its formula with the default manager
    /// configuration.
    pub fn load(source: &ModelSource) -> Result<Arc<Self>, ModelError> {
        Self::load_with_config(source, &BddConfig::default())
    }

    pub fn load_with_config(source: &ModelSource, config: &BddConfig) -> Result<Arc<Self>, ModelError> {
        let tree = FeatureTree::build(source)?;
        let formula = compile_with_config(&tree, config)?;
        info!(
            "Loaded feature model `{}`: {} features, formula of {} nodes",
            tree.root().name(),
            tree.len(),
            formula.size()
        );
        Ok(Arc::new(Self {
            tree,
            engine: SatEngine::new(formula),
        }))
    }

    pub fn tree(&self) -> &FeatureTree {
        &self.tree
    }

    pub fn engine(&self) -> &SatEngine {
        &self.engine
    }

    /// Resolve a feature name.
    pub fn feature_id(&self, name: &str) -> Result<FeatureId, ConfigurationError> {
        self.tree
            .id(name)
            .ok_or_else(|| ConfigurationError::UnknownFeature(name.to_string()))
    }

    /// The configuration with nothing decided by the user.
    pub fn empty_configuration(self: &Arc<Self>) -> ConfigurationState {
        ConfigurationState::new(Arc::clone(self))
    }

    /// A configuration from the names a form reports as selected and
    /// deselected.
    pub fn configuration<'a>(
        self: &Arc<Self>,
        selected: impl IntoIterator<Item = &'a str>,
        deselected: impl IntoIterator<Item = &'a str>,
    ) -> Result<ConfigurationState, ConfigurationError> {
        let selected = selected
            .into_iter()
            .map(|name| self.feature_id(name))
            .collect::<Result<Vec<_>, _>>()?;
        let deselected = deselected
            .into_iter()
            .map(|name| self.feature_id(name))
            .collect::<Result<Vec<_>, _>>()?;
        ConfigurationState::from_manual(Arc::clone(self), selected, deselected)
    }

    /// Restore a persisted configuration.
    pub fn deserialize(self: &Arc<Self>, text: &str) -> Result<ConfigurationState, ConfigurationError> {
        ConfigurationState::deserialize(self, text)
    }
}
