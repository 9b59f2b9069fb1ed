//! Bootstrap sequencing
//!
//! Linear once started: resolve plugins, plan targets, run one full build,
//! start the supervised application, wait a fixed settling delay, start the
//! continuous bundler, then hand control to the watch loop. Everything up
//! to the loop is fatal on failure; afterwards failures are per-action.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::build::{AssetBuilder, CommandBuilder};
use crate::config::Config;
use crate::error::DevloopResult;
use crate::plugins::active_plugins;
use crate::supervisor::ProcessSupervisor;
use crate::targets::plan_targets;
use crate::watcher::{self, DevEvent};

/// Invocation modes for a dev run.
#[derive(Debug, Clone, Default)]
pub struct DevOptions {
    /// Skip the active-plugin list entirely; watch first-party trees only
    pub core_only: bool,
    /// Skip the initial full build (assets assumed current)
    pub skip_build: bool,
    /// Pass full verbosity through to the supervised application
    pub verbose: bool,
}

/// Run the orchestrator until the running flag clears.
pub fn run<F>(
    config: &Config,
    config_path: &Path,
    options: &DevOptions,
    running: Arc<AtomicBool>,
    on_event: F,
) -> DevloopResult<()>
where
    F: Fn(DevEvent),
{
    let app_root = config
        .app
        .root
        .canonicalize()
        .unwrap_or_else(|_| config.app.root.clone());

    let plugins = active_plugins(config, options.core_only)?;
    info!("watching for {} active plugins", plugins.len());

    let targets = plan_targets(&plugins, config.watch.debounce())?;

    let mut builder = CommandBuilder::new(config_path.to_path_buf());
    if options.skip_build {
        info!("skipping initial build");
    } else {
        builder.build_all(false)?;
    }

    let mut supervisor = ProcessSupervisor::new(config, options.verbose);
    let pid = supervisor.start()?;
    on_event(DevEvent::AppStarted { pid });

    // the full build writes a burst of compiled files; let the tree settle
    // before the bundler's own watcher attaches
    thread::sleep(config.watch.settle());

    let mut bundler = builder.spawn_bundler_watch()?;

    let result = watcher::watch(
        &app_root,
        &targets,
        &mut builder,
        &mut supervisor,
        running,
        on_event,
    );

    if let Err(e) = bundler.kill() {
        warn!("could not stop bundler: {e}");
    }
    let _ = bundler.wait();
    supervisor.stop();

    result
}
