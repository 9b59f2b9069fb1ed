//! devloop - development-mode watch, rebuild, and reload orchestrator
//!
//! devloop keeps a running application process and its compiled assets in
//! sync with source changes: it watches disjoint groups of paths, maps
//! each group to one incremental-build action, invokes the external build
//! collaborator, and either restarts the managed child process or notifies
//! it in place that an asset class changed.

pub mod bootstrap;
pub mod build;
pub mod classify;
pub mod config;
pub mod error;
pub mod plugins;
pub mod supervisor;
pub mod targets;
pub mod watcher;

// Re-exports for convenience
pub use bootstrap::{run, DevOptions};
pub use build::{AssetBuilder, BuildPlan, CommandBuilder, RunningBuild};
pub use classify::{classify, CompilingMessage, LogicalAction};
pub use config::{Config, ConfigWarning};
pub use error::{DevloopError, DevloopResult};
pub use plugins::{active_plugins, resolve_base_themes};
pub use supervisor::ProcessSupervisor;
pub use targets::{plan_targets, watch_roots, TargetName, WatchTarget};
pub use watcher::{watch, DebounceState, DevEvent, Dispatcher};
