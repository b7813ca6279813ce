//! Persisted form of a configuration.
//!
//! A document lists every feature of the model, in pre-order, with its
//! manual decision and, informatively, its automatic one:
//!
//! ```json
//! {
//!   "features": [
//!     { "name": "R", "manual": "undefined", "automatic": "selected" },
//!     { "name": "A", "manual": "selected", "automatic": "undefined", "value": "42" }
//!   ]
//! }
//! ```
//!
//! Only the manual decisions and the values are read back; the automatic
//! ones are recomputed from the model.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::configuration::ConfigurationState;
use crate::error::ConfigurationError;
use crate::feature::FeatureId;
use crate::model::FeatureModel;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Selected,
    Unselected,
    #[default]
    Undefined,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub name: String,
    #[serde(default)]
    pub manual: Selection,
    #[serde(default)]
    pub automatic: Selection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDocument {
    pub features: Vec<FeatureRecord>,
}

impl ConfigurationState {
    /// Snapshot of this state as a document.
    pub fn to_document(&self) -> ConfigurationDocument {
        let features = self
            .model()
            .tree()
            .features()
            .map(|feature| {
                let id = feature.id();
                let manual = if self.is_selected(id) {
                    Selection::Selected
                } else if self.is_deselected(id) {
                    Selection::Unselected
                } else {
                    Selection::Undefined
                };
                let automatic = if self.is_activated(id) {
                    Selection::Selected
                } else if self.is_deactivated(id) {
                    Selection::Unselected
                } else {
                    Selection::Undefined
                };
                FeatureRecord {
                    name: feature.name().to_string(),
                    manual,
                    automatic,
                    value: self.value(id).map(str::to_string),
                }
            })
            .collect();
        ConfigurationDocument { features }
    }

    /// Rebuild a state from the manual decisions and values of a document.
    ///
    /// Features the document does not mention stay undecided.
    pub fn from_document(
        model: &Arc<FeatureModel>,
        document: &ConfigurationDocument,
    ) -> Result<Self, ConfigurationError> {
        let mut selected = BTreeSet::new();
        let mut deselected = BTreeSet::new();
        let mut values = BTreeMap::new();

        for record in &document.features {
            let id: FeatureId = model.feature_id(&record.name)?;
            match record.manual {
                Selection::Selected => {
                    deselected.remove(&id);
                    selected.insert(id);
                }
                Selection::Unselected => {
                    selected.remove(&id);
                    deselected.insert(id);
                }
                Selection::Undefined => {}
            }
            if let Some(value) = &record.value {
                if model.tree()[id].has_value() {
                    values.insert(id, value.clone());
                } else {
                    warn!("Ignoring value of feature `{}`, which carries none", record.name);
                }
            }
        }

        debug!(
            "Restored configuration: {} selected, {} deselected, {} values",
            selected.len(),
            deselected.len(),
            values.len()
        );
        Ok(Self::from_parts(Arc::clone(model), selected, deselected, values))
    }

    /// Persist a complete configuration.
    pub fn serialize(&self) -> Result<String, ConfigurationError> {
        if !self.is_complete() {
            return Err(ConfigurationError::Incomplete);
        }
        serde_json::to_string_pretty(&self.to_document()).map_err(ConfigurationError::Encode)
    }

    /// Restore a configuration persisted by [`serialize`][Self::serialize].
    pub fn deserialize(model: &Arc<FeatureModel>, text: &str) -> Result<Self, ConfigurationError> {
        let document: ConfigurationDocument = serde_json::from_str(text)?;
        Self::from_document(model, &document)
    }
}
