//! Error types for devloop
//!
//! Uses `thiserror` for library errors. The variants map onto the failure
//! classes the orchestrator distinguishes: fatal bootstrap problems
//! (config, plugin state, initial build), recoverable theme-resolution and
//! incremental-build failures, and child-process spawn failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for devloop operations
pub type DevloopResult<T> = Result<T, DevloopError>;

/// Main error type for devloop operations
#[derive(Error, Debug)]
pub enum DevloopError {
    /// Invalid configuration file
    #[error("invalid config in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// The active-plugin state file exists but cannot be parsed
    #[error("invalid plugin state in {file}: {message}")]
    PluginState { file: PathBuf, message: String },

    /// A theme's metadata could not be read or parsed
    #[error("cannot read theme metadata for '{theme}': {message}")]
    ThemeMeta { theme: String, message: String },

    /// A base-theme declaration loops back onto an already-visited theme
    #[error("base theme cycle detected at '{theme}' (chain: {chain})")]
    ThemeCycle { theme: String, chain: String },

    /// A build invocation exited unsuccessfully
    #[error("build command '{command}' failed: {status}")]
    Build { command: String, status: String },

    /// The application (or bundler) process could not be spawned
    #[error("failed to spawn '{command}': {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// File watcher registration or delivery failure
    #[error("file watcher error: {0}")]
    Watch(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
