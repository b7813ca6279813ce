use std::sync::Arc;
use std::thread;

use test_log::test;

use fm_config::configuration::{ConfigurationState, FeatureState};
use fm_config::feature::{FeatureId, GroupType};
use fm_config::model::FeatureModel;
use fm_config::source::{ConstraintDecl, FeatureDecl, ModelSource};

/// Root `R` with an alternative group `{A, B}` and an optional `C`,
/// plus `A -> C`. The group hangs off the mandatory abstract feature `G`.
fn scenario() -> Arc<FeatureModel> {
    FeatureModel::load(
        &ModelSource::new(
            FeatureDecl::new("R")
                .mandatory()
                .group("and")
                .child(
                    FeatureDecl::new("G")
                        .mandatory()
                        .group("alt")
                        .child(FeatureDecl::new("A"))
                        .child(FeatureDecl::new("B")),
                )
                .child(FeatureDecl::new("C")),
        )
        .constraint(ConstraintDecl::implies(ConstraintDecl::var("A"), ConstraintDecl::var("C"))),
    )
    .unwrap()
}

fn phone() -> Arc<FeatureModel> {
    FeatureModel::load(
        &ModelSource::new(
            FeatureDecl::new("Phone")
                .group("and")
                .child(FeatureDecl::new("Calls").mandatory())
                .child(
                    FeatureDecl::new("Screen")
                        .mandatory()
                        .group("alt")
                        .child(FeatureDecl::new("Basic"))
                        .child(FeatureDecl::new("Color"))
                        .child(FeatureDecl::new("HighRes")),
                )
                .child(FeatureDecl::new("GPS"))
                .child(
                    FeatureDecl::new("Media")
                        .group("or")
                        .child(FeatureDecl::new("Camera"))
                        .child(FeatureDecl::new("MP3")),
                ),
        )
        .constraint(ConstraintDecl::implies(
            ConstraintDecl::var("Camera"),
            ConstraintDecl::var("HighRes"),
        ))
        .constraint(ConstraintDecl::not(ConstraintDecl::and(
            ConstraintDecl::var("GPS"),
            ConstraintDecl::var("Basic"),
        ))),
    )
    .unwrap()
}

fn id(model: &FeatureModel, name: &str) -> FeatureId {
    model.feature_id(name).unwrap()
}

/// Every combination of manual decisions over the first `n` features.
fn all_manual_states(model: &Arc<FeatureModel>, n: usize) -> Vec<ConfigurationState> {
    let ids: Vec<FeatureId> = model.tree().feature_ids().take(n).collect();
    let mut states = Vec::new();
    for code in 0..3usize.pow(ids.len() as u32) {
        let mut rest = code;
        let mut selected = Vec::new();
        let mut deselected = Vec::new();
        for &f in &ids {
            match rest % 3 {
                1 => selected.push(f),
                2 => deselected.push(f),
                _ => {}
            }
            rest /= 3;
        }
        states.push(ConfigurationState::from_manual(Arc::clone(model), selected, deselected).unwrap());
    }
    states
}

#[test]
fn test_scenario_select_a_activates_c() {
    let model = scenario();
    let config = model.empty_configuration().with_selection(id(&model, "A")).unwrap();
    assert!(config.is_valid());
    assert!(config.is_enabled(id(&model, "C")));
    assert!(config.is_activated(id(&model, "C")));
    assert!(config.is_deactivated(id(&model, "B")));
}

#[test]
fn test_scenario_select_b_leaves_c_open() {
    let model = scenario();
    let config = model.empty_configuration().with_selection(id(&model, "B")).unwrap();
    let c = id(&model, "C");
    assert!(config.is_valid());
    assert!(!config.is_activated(c));
    assert!(!config.is_deactivated(c));
    assert_eq!(config.state(c), FeatureState::Undetermined);
}

#[test]
fn test_scenario_select_a_deselect_c_is_invalid() {
    let model = scenario();
    let config = model
        .empty_configuration()
        .with_selection(id(&model, "A"))
        .unwrap()
        .with_deselection(id(&model, "C"))
        .unwrap();
    assert!(!config.is_valid());
    assert!(!config.is_complete());
}

#[test]
fn test_empty_configuration_is_valid() {
    for model in [scenario(), phone()] {
        let config = model.empty_configuration();
        assert!(!model.engine().is_void());
        assert!(config.is_valid());
    }
}

#[test]
fn test_mandatory_children_follow_parent() {
    let model = phone();
    let tree = model.tree();
    for config in all_manual_states(&model, tree.len().min(7)) {
        if !config.is_valid() {
            continue;
        }
        for feature in tree.features().filter(|f| f.is_mandatory()) {
            let Some(parent) = feature.parent() else { continue };
            if config.is_enabled(parent) {
                assert!(
                    config.is_enabled(feature.id()),
                    "{} not enabled under {:?}",
                    feature.name(),
                    config
                );
            }
        }
    }
}

#[test]
fn test_alternative_children_are_exclusive() {
    let model = phone();
    let tree = model.tree();
    for config in all_manual_states(&model, tree.len().min(7)) {
        if !config.is_valid() {
            continue;
        }
        for feature in tree.features().filter(|f| f.group() == GroupType::Alternative) {
            let enabled = feature.children().iter().filter(|&&c| config.is_enabled(c)).count();
            assert!(enabled <= 1, "{} children of {} enabled", enabled, feature.name());
        }
    }
}

#[test]
fn test_derived_sets_are_disjoint_and_exclude_manual() {
    let model = scenario();
    for config in all_manual_states(&model, model.tree().len()) {
        let activated = config.activated_features();
        let deactivated = config.deactivated_features();
        assert!(activated.is_disjoint(deactivated));
        assert!(activated.iter().chain(deactivated).all(|&f| !config.is_manual(f)));
    }
}

#[test]
fn test_mutual_exclusion_makes_invalid() {
    let model = phone();

    let alternative = model
        .empty_configuration()
        .with_selection(id(&model, "Basic"))
        .unwrap()
        .with_selection(id(&model, "Color"))
        .unwrap();
    assert!(!alternative.is_valid());

    let cross_tree = model
        .empty_configuration()
        .with_selection(id(&model, "GPS"))
        .unwrap()
        .with_selection(id(&model, "Basic"))
        .unwrap();
    assert!(!cross_tree.is_valid());
}

#[test]
fn test_round_trip_of_complete_configuration() {
    let model = phone();
    let config = model.configuration(["Camera", "GPS"], ["MP3"]).unwrap();
    assert!(config.is_valid());
    assert!(config.is_complete());

    let restored = model.deserialize(&config.serialize().unwrap()).unwrap();
    assert_eq!(restored.selected(), config.selected());
    assert_eq!(restored.deselected(), config.deselected());
    assert_eq!(restored.activated_features(), config.activated_features());
    assert_eq!(restored.deactivated_features(), config.deactivated_features());
}

#[test]
fn test_queries_are_idempotent() {
    let model = phone();
    let config = model.empty_configuration().with_selection(id(&model, "Camera")).unwrap();
    let valid = config.is_valid();
    let activated = config.activated_features().clone();
    assert_eq!(config.is_valid(), valid);
    assert_eq!(config.activated_features(), &activated);

    let count = model.engine().count_configurations();
    let _ = config.with_deselection(id(&model, "GPS")).unwrap().activated_features();
    assert_eq!(model.engine().count_configurations(), count);
}

#[test]
fn test_shared_between_threads() {
    let model = phone();
    let config = Arc::new(model.empty_configuration().with_selection(id(&model, "HighRes")).unwrap());
    let expected = {
        let fresh = model.empty_configuration().with_selection(id(&model, "HighRes")).unwrap();
        (fresh.activated_features().clone(), fresh.deactivated_features().clone())
    };

    thread::scope(|s| {
        for _ in 0..4 {
            let config = Arc::clone(&config);
            let expected = &expected;
            s.spawn(move || {
                assert!(config.is_valid());
                assert_eq!(config.activated_features(), &expected.0);
                assert_eq!(config.deactivated_features(), &expected.1);
            });
        }
    });
}
