//! # fm-config: interactive feature-model configuration
//!
//! **`fm-config`** answers the questions a configurator asks while a user fills in a feature model:
//! which features are now forced on, which are forced off, and whether the choices made so far
//! can still be completed into a valid product.
//!
//! ## How it works
//!
//! A feature model is a tree of features with group semantics (`and`, `or`, `alt`) plus
//! cross-tree constraints. Loading a model compiles all of it, once, into a single
//! **Binary Decision Diagram** (reduced, ordered, with complement edges) and freezes the result.
//! Every later query is a read-only walk of the frozen diagram under a set of assumed literals,
//! so a loaded model can be shared between any number of threads.
//!
//! - **Validity**: the manual decisions are satisfiable together with the model.
//! - **Activation**: a feature is activated if no valid completion deselects it.
//! - **Deactivation**: a feature is deactivated if no valid completion selects it.
//!
//! ## Basic Usage
//!
//! ```rust
//! use fm_config::model::FeatureModel;
//! use fm_config::source::{ConstraintDecl, FeatureDecl, ModelSource};
//!
//! let source = ModelSource::new(
//!     FeatureDecl::new("Phone")
//!         .group("and")
//!         .child(
//!             FeatureDecl::new("Screen")
//!                 .mandatory()
//!                 .group("alt")
//!                 .child(FeatureDecl::new("Basic"))
//!                 .child(FeatureDecl::new("HighRes")),
//!         )
//!         .child(FeatureDecl::new("Camera")),
//! )
//! .constraint(ConstraintDecl::implies(
//!     ConstraintDecl::var("Camera"),
//!     ConstraintDecl::var("HighRes"),
//! ));
//!
//! let model = FeatureModel::load(&source).unwrap();
//! let camera = model.feature_id("Camera").unwrap();
//! let basic = model.feature_id("Basic").unwrap();
//!
//! let config = model.empty_configuration().with_selection(camera).unwrap();
//! assert!(config.is_valid());
//! assert!(config.is_deactivated(basic));
//! ```
//!
//! ## Core Components
//!
//! - **[`tree`]**: the validated feature tree, built from an untyped [`source`] declaration.
//! - **[`formula`]**: compilation of a tree into a frozen diagram, using the [`bdd`] manager.
//! - **[`engine`]**: satisfiability, forced literals, core and dead features.
//! - **[`configuration`]**: immutable configuration states and their derived sets.
//! - **[`persist`]**: the JSON form of a configuration.

pub mod bdd;
pub mod cache;
pub mod configuration;
pub mod engine;
pub mod error;
pub mod expr;
pub mod feature;
pub mod formula;
pub mod model;
pub mod node;
pub mod persist;
pub mod reference;
pub mod sat;
pub mod source;
pub mod table;
pub mod tree;
pub mod types;
pub mod utils;
