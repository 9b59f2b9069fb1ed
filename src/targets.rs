//! Watch-target planning
//!
//! Derives the six watch targets from the resolved plugin set: five asset
//! classes whose patterns grow with each plugin, plus a fixed server-source
//! target that is independent of the plugin list. Patterns use gitignore
//! syntax so the server target can carve out its upgrade-scripts subtree
//! with a `!` line. Planning is deterministic: the same plugin list and
//! debounce interval always produce the same targets, in the same order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::Serialize;

use crate::error::{DevloopError, DevloopResult};

/// Names of the six watch targets, fixed at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetName {
    #[serde(rename = "client-style")]
    StyleClient,
    #[serde(rename = "acp-style")]
    StyleAdmin,
    #[serde(rename = "client-js")]
    Client,
    #[serde(rename = "templates")]
    Templates,
    #[serde(rename = "languages")]
    Languages,
    #[serde(rename = "server")]
    Server,
}

impl TargetName {
    /// All targets, in planning order.
    pub const ALL: [TargetName; 6] = [
        TargetName::StyleClient,
        TargetName::StyleAdmin,
        TargetName::Client,
        TargetName::Templates,
        TargetName::Languages,
        TargetName::Server,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetName::StyleClient => "client-style",
            TargetName::StyleAdmin => "acp-style",
            TargetName::Client => "client-js",
            TargetName::Templates => "templates",
            TargetName::Languages => "languages",
            TargetName::Server => "server",
        }
    }
}

impl std::fmt::Display for TargetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, pattern-bearing, debounced unit of file-system observation.
///
/// Patterns are relative to the app root and may reference paths that do
/// not exist yet (a plugin installed later simply starts matching).
pub struct WatchTarget {
    pub name: TargetName,
    pub patterns: Vec<String>,
    pub debounce: Duration,
    matcher: Gitignore,
}

impl std::fmt::Debug for WatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchTarget")
            .field("name", &self.name)
            .field("patterns", &self.patterns.len())
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl WatchTarget {
    pub fn new(name: TargetName, patterns: Vec<String>, debounce: Duration) -> DevloopResult<Self> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in &patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| DevloopError::Watch(format!("invalid pattern '{pattern}': {e}")))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| DevloopError::Watch(e.to_string()))?;

        Ok(Self {
            name,
            patterns,
            debounce,
            matcher,
        })
    }

    /// Check whether a path (relative to the app root) belongs to this target.
    pub fn matches(&self, rel_path: &Path) -> bool {
        self.matcher
            .matched_path_or_any_parents(rel_path, false)
            .is_ignore()
    }
}

fn plugin_dir(plugin: &str) -> String {
    format!("node_modules/{plugin}")
}

fn style_patterns(plugins: &[String]) -> Vec<String> {
    let mut patterns = vec!["public/scss/**/*.scss".to_string()];
    for plugin in plugins {
        let dir = plugin_dir(plugin);
        patterns.push(format!("{dir}/*.scss"));
        patterns.push(format!("{dir}/*.css"));
        for sub in ["public", "static", "scss"] {
            patterns.push(format!("{dir}/{sub}/**/*.scss"));
        }
        for sub in ["public", "static"] {
            patterns.push(format!("{dir}/{sub}/**/*.css"));
        }
    }
    patterns
}

fn client_patterns(plugins: &[String]) -> Vec<String> {
    let mut patterns = Vec::new();
    for plugin in plugins {
        let dir = plugin_dir(plugin);
        for sub in ["public", "static"] {
            patterns.push(format!("{dir}/{sub}/**/*.js"));
        }
    }
    patterns.push("node_modules/benchpressjs/build/benchpress.js".to_string());
    patterns
}

fn template_patterns(plugins: &[String]) -> Vec<String> {
    let mut patterns = vec!["src/views/**/*.tpl".to_string()];
    for plugin in plugins {
        let dir = plugin_dir(plugin);
        for sub in ["public", "static", "templates"] {
            patterns.push(format!("{dir}/{sub}/**/*.tpl"));
        }
    }
    patterns
}

fn language_patterns(plugins: &[String]) -> Vec<String> {
    let mut patterns = vec![
        "public/language/en-GB/*.json".to_string(),
        "public/language/en-GB/**/*.json".to_string(),
    ];
    for plugin in plugins {
        let dir = plugin_dir(plugin);
        for sub in ["public", "static", "languages"] {
            patterns.push(format!("{dir}/{sub}/**/*.json"));
        }
    }
    patterns
}

fn server_patterns() -> Vec<String> {
    vec![
        // leading slash anchors to the app root, otherwise any nested
        // app.js (e.g. inside a plugin) would fire a full reload
        "/app.js".to_string(),
        "install/*.js".to_string(),
        "src/**/*.js".to_string(),
        "public/src/modules/translator.common.js".to_string(),
        "public/src/modules/helpers.common.js".to_string(),
        "public/src/utils.common.js".to_string(),
        "!src/upgrades/**".to_string(),
    ]
}

/// Build the six watch targets for the given plugin set.
///
/// The five asset-class targets union first-party patterns with one pattern
/// group per plugin; the server target is plugin-independent.
pub fn plan_targets(plugins: &[String], debounce: Duration) -> DevloopResult<Vec<WatchTarget>> {
    let mut targets = Vec::with_capacity(TargetName::ALL.len());
    for name in TargetName::ALL {
        let patterns = match name {
            TargetName::StyleClient | TargetName::StyleAdmin => style_patterns(plugins),
            TargetName::Client => client_patterns(plugins),
            TargetName::Templates => template_patterns(plugins),
            TargetName::Languages => language_patterns(plugins),
            TargetName::Server => server_patterns(),
        };
        targets.push(WatchTarget::new(name, patterns, debounce)?);
    }
    Ok(targets)
}

fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Longest glob-free prefix of each pattern, deduplicated and pruned so no
/// returned root is nested inside another. These are the directories (or
/// single files) handed to the file watcher; matching against the full
/// pattern set happens per event.
pub fn watch_roots(targets: &[WatchTarget]) -> Vec<PathBuf> {
    let mut roots: BTreeSet<PathBuf> = BTreeSet::new();
    for target in targets {
        for pattern in &target.patterns {
            if pattern.starts_with('!') {
                continue;
            }
            let literal: PathBuf = pattern
                .trim_start_matches('/')
                .split('/')
                .take_while(|component| !has_glob_meta(component))
                .collect();
            if literal.as_os_str().is_empty() {
                continue;
            }
            roots.insert(literal);
        }
    }

    let mut pruned: Vec<PathBuf> = Vec::new();
    for root in roots {
        if !pruned.iter().any(|kept| root.starts_with(kept)) {
            pruned.push(root);
        }
    }
    pruned
}
