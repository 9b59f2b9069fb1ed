//! Configuration module for devloop
//!
//! A single TOML file (`devloop.toml` by default) describes the supervised
//! application, the build collaborator's command lines, watch timing, and
//! where the persisted plugin state lives. A missing file falls back to
//! defaults; a malformed file is a fatal bootstrap error. Unknown keys are
//! surfaced as non-fatal warnings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DevloopError, DevloopResult};

/// The supervised application process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application root; all watch patterns and relative paths resolve here
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Program used to run the application
    #[serde(default = "default_command")]
    pub command: String,

    /// Fixed argument list for the application process
    #[serde(default = "default_app_args")]
    pub args: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            command: default_command(),
            args: default_app_args(),
        }
    }
}

/// The external asset-build collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Program used for build invocations
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments for a build invocation; incremental targets are appended
    #[serde(default = "default_build_args")]
    pub args: Vec<String>,

    /// Arguments for the long-lived continuous bundler process
    #[serde(default = "default_bundler_args")]
    pub bundler_args: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_build_args(),
            bundler_args: default_bundler_args(),
        }
    }
}

/// Watch timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet interval per target before a change burst is acted on
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Delay between the initial full build and starting the bundler watch
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

/// Persisted plugin state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// JSON array of active plugin identifiers, relative to the app root
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Plugin/theme install tree, relative to the app root
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            modules_dir: default_modules_dir(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_command() -> String {
    "node".to_string()
}

fn default_app_args() -> Vec<String> {
    vec!["app.js".to_string()]
}

fn default_build_args() -> Vec<String> {
    vec!["nodebb".to_string(), "build".to_string()]
}

fn default_bundler_args() -> Vec<String> {
    vec![
        "nodebb".to_string(),
        "webpack".to_string(),
        "--watch".to_string(),
    ]
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_state_file() -> PathBuf {
    PathBuf::from("data/active_plugins.json")
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> DevloopResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> DevloopResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            unknown_paths.push(path.to_string());
        })
        .map_err(|e| DevloopError::Config {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|path_str| {
                let key = path_str
                    .split('.')
                    .next_back()
                    .unwrap_or(path_str.as_str())
                    .to_string();
                ConfigWarning {
                    line: find_line_number(&content, &key),
                    key,
                    file: path.to_path_buf(),
                }
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load from the given path, or fall back to defaults when the file
    /// does not exist. A malformed file is still an error.
    pub fn load_or_default(path: &Path) -> DevloopResult<(Self, Vec<ConfigWarning>)> {
        if !path.exists() {
            return Ok((Self::default(), Vec::new()));
        }
        Self::load_with_warnings(path)
    }
}

fn find_line_number(content: &str, key: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| {
            line.trim_start()
                .strip_prefix(key)
                .map(|rest| rest.trim_start().starts_with('='))
                .unwrap_or(false)
        })
        .map(|idx| idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.app.command, "node");
        assert_eq!(config.app.args, vec!["app.js"]);
        assert_eq!(config.watch.debounce_ms, 1000);
        assert_eq!(config.watch.settle_ms, 1000);
        assert_eq!(config.plugins.modules_dir, PathBuf::from("node_modules"));
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let dir = tempdir().unwrap();
        let (config, warnings) = Config::load_or_default(&dir.path().join("devloop.toml")).unwrap();
        assert_eq!(config.watch.debounce_ms, 1000);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devloop.toml");
        fs::write(&path, "[watch]\ndebounce_ms = 250\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.watch.debounce_ms, 250);
        assert_eq!(config.watch.settle_ms, 1000);
        assert_eq!(config.app.command, "node");
    }

    #[test]
    fn test_unknown_key_is_warning_not_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devloop.toml");
        fs::write(&path, "[watch]\ndebounce_ms = 250\nfoo = 1\n").unwrap();

        let (config, warnings) = Config::load_with_warnings(&path).unwrap();
        assert_eq!(config.watch.debounce_ms, 250);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "foo");
        assert_eq!(warnings[0].line, Some(3));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devloop.toml");
        fs::write(&path, "[watch\ndebounce_ms = 250\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(DevloopError::Config { .. })));
    }

    #[test]
    fn test_debounce_duration_helper() {
        let config = Config::default();
        assert_eq!(config.watch.debounce(), Duration::from_millis(1000));
        assert_eq!(config.watch.settle(), Duration::from_millis(1000));
    }
}
