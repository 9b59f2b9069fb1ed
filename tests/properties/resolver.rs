//! Property tests for base-theme resolution.

use proptest::prelude::*;
use tempfile::TempDir;

use devloop::plugins::resolve_base_themes;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a plugin list without a theme identifier resolves to
    /// itself (identity).
    #[test]
    fn property_no_theme_is_identity(
        plugins in proptest::collection::vec("nodebb-plugin-[a-z]{1,12}", 0..8)
    ) {
        let modules = TempDir::new().unwrap();
        let resolved = resolve_base_themes(modules.path(), &plugins);
        prop_assert_eq!(resolved, plugins);
    }

    /// PROPERTY: resolution only ever appends; the input prefix survives
    /// untouched even when theme manifests are unreadable.
    #[test]
    fn property_resolution_never_reorders(
        plugins in proptest::collection::vec("nodebb-(plugin|theme)-[a-z]{1,12}", 0..8)
    ) {
        let modules = TempDir::new().unwrap();
        let resolved = resolve_base_themes(modules.path(), &plugins);
        prop_assert!(resolved.len() >= plugins.len());
        prop_assert_eq!(&resolved[..plugins.len()], &plugins[..]);
    }
}
