//! Active-plugin state and base-theme resolution
//!
//! The application persists its active plugins as an ordered list; devloop
//! reads that list once at startup and never writes it back. If the list
//! names a theme, the theme's declared base chain is appended so inherited
//! assets are watched and rebuilt too. Theme resolution is best-effort
//! enrichment: a broken or missing theme manifest degrades watch coverage,
//! not startup.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{DevloopError, DevloopResult};

/// Naming convention that marks a plugin identifier as a theme.
pub const THEME_PREFIX: &str = "nodebb-theme-";

/// Composer plugin activated by default when the app has none configured.
pub const COMPOSER_DEFAULT: &str = "nodebb-plugin-composer-default";

/// The slice of a theme's manifest the resolver cares about.
#[derive(Debug, Deserialize)]
pub struct ThemeManifest {
    #[serde(rename = "baseTheme")]
    pub base_theme: Option<String>,
}

/// Read the persisted active-plugin list.
///
/// A missing file means the store has no entry yet and yields an empty
/// list; a file that exists but cannot be parsed is a fatal startup error.
pub fn load_active_plugins(state_file: &Path) -> DevloopResult<Vec<String>> {
    if !state_file.exists() {
        debug!("no plugin state at {}", state_file.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(state_file)?;
    serde_json::from_str(&content).map_err(|e| DevloopError::PluginState {
        file: state_file.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read the declared base of a single theme from its manifest.
fn declared_base(modules_dir: &Path, theme_id: &str) -> DevloopResult<Option<String>> {
    let manifest_path = modules_dir.join(theme_id).join("theme.json");
    let content = fs::read_to_string(&manifest_path).map_err(|e| DevloopError::ThemeMeta {
        theme: theme_id.to_string(),
        message: format!("{}: {e}", manifest_path.display()),
    })?;
    let manifest: ThemeManifest =
        serde_json::from_str(&content).map_err(|e| DevloopError::ThemeMeta {
            theme: theme_id.to_string(),
            message: e.to_string(),
        })?;
    Ok(manifest.base_theme)
}

/// Append the base-theme chain of the active theme to the plugin list.
///
/// The first identifier carrying the theme prefix is the active theme; no
/// theme means no work. Each base is appended in declaration order. The
/// walk stops with a logged warning, never an abort, when a manifest
/// cannot be read or when a declaration loops back onto a theme already in
/// the chain.
pub fn resolve_base_themes(modules_dir: &Path, plugins: &[String]) -> Vec<String> {
    let mut resolved = plugins.to_vec();

    let Some(theme_id) = plugins.iter().find(|p| p.starts_with(THEME_PREFIX)) else {
        return resolved;
    };

    let mut chain = vec![theme_id.clone()];
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(theme_id.clone());

    let mut current = theme_id.clone();
    loop {
        match declared_base(modules_dir, &current) {
            Ok(Some(base)) => {
                if !visited.insert(base.clone()) {
                    let err = DevloopError::ThemeCycle {
                        theme: base,
                        chain: chain.join(" -> "),
                    };
                    warn!("base theme resolution stopped: {err}");
                    break;
                }
                chain.push(base.clone());
                resolved.push(base.clone());
                current = base;
            }
            Ok(None) => break,
            Err(err) => {
                warn!("base theme resolution stopped: {err}");
                break;
            }
        }
    }

    resolved
}

/// Append the default composer plugin when the list does not carry one.
pub fn ensure_composer_default(plugins: &mut Vec<String>) {
    if !plugins.iter().any(|p| p == COMPOSER_DEFAULT) {
        plugins.push(COMPOSER_DEFAULT.to_string());
    }
}

/// The bootstrap entry: load, enrich with base themes, add the composer.
///
/// With `core_only` the store is not consulted at all and the plugin set
/// stays empty; minimal bootstraps watch first-party trees only.
pub fn active_plugins(config: &Config, core_only: bool) -> DevloopResult<Vec<String>> {
    if core_only {
        return Ok(Vec::new());
    }

    let root = &config.app.root;
    let mut plugins = load_active_plugins(&root.join(&config.plugins.state_file))?;
    plugins = resolve_base_themes(&root.join(&config.plugins.modules_dir), &plugins);
    ensure_composer_default(&mut plugins);
    Ok(plugins)
}
