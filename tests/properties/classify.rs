//! Property tests for change classification.

use proptest::prelude::*;

use devloop::classify::{classify, LogicalAction};
use devloop::targets::TargetName;

fn target_name() -> impl Strategy<Value = TargetName> {
    prop_oneof![
        Just(TargetName::StyleClient),
        Just(TargetName::StyleAdmin),
        Just(TargetName::Client),
        Just(TargetName::Templates),
        Just(TargetName::Languages),
        Just(TargetName::Server),
    ]
}

proptest! {
    /// PROPERTY: classification is deterministic; the same target always
    /// maps to the same action, no matter how often it is asked.
    #[test]
    fn property_classify_is_deterministic(name in target_name()) {
        let first = classify(name);
        for _ in 0..1000 {
            prop_assert_eq!(classify(name), first);
        }
    }

    /// PROPERTY: only the server target is terminal; every other target
    /// classifies to an action with a build identifier.
    #[test]
    fn property_only_server_reloads(name in target_name()) {
        let action = classify(name);
        if name == TargetName::Server {
            prop_assert_eq!(action, LogicalAction::ServerReload);
        } else {
            prop_assert!(action.build_id().is_some());
        }
    }
}
