//! Property tests for watch-target planning.

use std::time::Duration;

use proptest::prelude::*;

use devloop::targets::{plan_targets, TargetName};

fn plugin_list() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("nodebb-(plugin|theme)-[a-z]{1,12}", 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: planning the same plugin list twice yields identical
    /// targets; there is no randomness or time dependence.
    #[test]
    fn property_planning_is_deterministic(plugins in plugin_list()) {
        let a = plan_targets(&plugins, Duration::from_millis(1000)).unwrap();
        let b = plan_targets(&plugins, Duration::from_millis(1000)).unwrap();

        prop_assert_eq!(a.len(), b.len());
        for (left, right) in a.iter().zip(b.iter()) {
            prop_assert_eq!(left.name, right.name);
            prop_assert_eq!(&left.patterns, &right.patterns);
        }
    }

    /// PROPERTY: the six target names are always present, unique, and in
    /// planning order, regardless of the plugin list.
    #[test]
    fn property_target_names_fixed(plugins in plugin_list()) {
        let targets = plan_targets(&plugins, Duration::from_millis(1000)).unwrap();
        let names: Vec<TargetName> = targets.iter().map(|t| t.name).collect();
        prop_assert_eq!(names, TargetName::ALL.to_vec());
    }

    /// PROPERTY: the server target never depends on the plugin list.
    #[test]
    fn property_server_target_is_plugin_independent(plugins in plugin_list()) {
        let with_plugins = plan_targets(&plugins, Duration::from_millis(1000)).unwrap();
        let without = plan_targets(&[], Duration::from_millis(1000)).unwrap();

        let server_a = with_plugins.iter().find(|t| t.name == TargetName::Server).unwrap();
        let server_b = without.iter().find(|t| t.name == TargetName::Server).unwrap();
        prop_assert_eq!(&server_a.patterns, &server_b.patterns);
    }
}
