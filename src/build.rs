//! Incremental build invocation
//!
//! The asset-build subsystem is an external collaborator: devloop invokes
//! it as a subprocess, either for everything at bootstrap or for one
//! logical action per classified change. Incremental invocations are
//! spawned without blocking so the dispatcher keeps classifying events
//! while builds run; a full reload resets the cached invocation plan so a
//! changed server file is picked up on the next build.

use std::env;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::debug;

use crate::classify::LogicalAction;
use crate::config::Config;
use crate::error::{DevloopError, DevloopResult};

/// Deployment-mode variable forwarded to every spawned process, defaulted
/// to development when unset.
pub(crate) fn node_env() -> String {
    env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string())
}

/// Seam between the dispatch loop and the asset-build subsystem.
pub trait AssetBuilder {
    /// Build every asset class. Blocking; bootstrap only.
    fn build_all(&mut self, webpack: bool) -> DevloopResult<()>;

    /// Start an incremental build for one action without waiting for it.
    fn spawn_build(&mut self, action: LogicalAction, webpack: bool)
        -> DevloopResult<RunningBuild>;

    /// Drop cached invocation state; the next build re-reads configuration.
    fn reset(&mut self);
}

/// An in-flight incremental build, polled by the dispatch loop.
#[derive(Debug)]
pub struct RunningBuild {
    pub action: LogicalAction,
    state: BuildState,
}

#[derive(Debug)]
enum BuildState {
    Running(Child),
    Finished(Option<Result<(), String>>),
}

impl RunningBuild {
    pub fn spawned(action: LogicalAction, child: Child) -> Self {
        Self {
            action,
            state: BuildState::Running(child),
        }
    }

    /// A build that is already complete; lets tests drive the dispatcher
    /// without real subprocesses.
    pub fn finished(action: LogicalAction, result: Result<(), String>) -> Self {
        Self {
            action,
            state: BuildState::Finished(Some(result)),
        }
    }

    /// Poll for completion. `None` while the build is still running; the
    /// result is yielded exactly once.
    pub fn try_finish(&mut self) -> Option<Result<(), String>> {
        match &mut self.state {
            BuildState::Running(child) => match child.try_wait() {
                Ok(None) => None,
                Ok(Some(status)) if status.success() => Some(Ok(())),
                Ok(Some(status)) => Some(Err(format!("exited with {status}"))),
                Err(e) => Some(Err(e.to_string())),
            },
            BuildState::Finished(result) => result.take(),
        }
    }
}

/// Resolved invocation for the build collaborator.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub program: String,
    pub args: Vec<String>,
    pub bundler_args: Vec<String>,
    pub cwd: PathBuf,
}

impl BuildPlan {
    fn from_config(config: &Config) -> Self {
        Self {
            program: config.build.command.clone(),
            args: config.build.args.clone(),
            bundler_args: config.build.bundler_args.clone(),
            cwd: config.app.root.clone(),
        }
    }

    fn command(&self, extra: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(extra)
            .current_dir(&self.cwd)
            .env("NODE_ENV", node_env());
        cmd
    }

    fn describe(&self, extra: &[String]) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.extend(extra.iter().cloned());
        parts.join(" ")
    }
}

/// Build invoker that shells out to the app's build entry point.
///
/// The invocation plan is derived lazily from the config file and cached
/// until [`AssetBuilder::reset`] clears it, so a server reload picks up
/// config edits on the next build.
pub struct CommandBuilder {
    config_path: PathBuf,
    plan: Option<BuildPlan>,
}

impl CommandBuilder {
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            plan: None,
        }
    }

    fn plan(&mut self) -> DevloopResult<&BuildPlan> {
        if self.plan.is_none() {
            let (config, _warnings) = Config::load_or_default(&self.config_path)?;
            debug!("build plan loaded from {}", self.config_path.display());
            self.plan = Some(BuildPlan::from_config(&config));
        }
        Ok(self.plan.as_ref().expect("plan was just set"))
    }

    fn webpack_args(webpack: bool) -> Vec<String> {
        if webpack {
            Vec::new()
        } else {
            vec!["--no-webpack".to_string()]
        }
    }

    /// Start the long-lived continuous bundler. The caller owns the child
    /// and kills it on shutdown.
    pub fn spawn_bundler_watch(&mut self) -> DevloopResult<Child> {
        let plan = self.plan()?;
        let mut cmd = Command::new(&plan.program);
        cmd.args(&plan.bundler_args)
            .current_dir(&plan.cwd)
            .env("NODE_ENV", node_env());
        let program = plan.program.clone();
        cmd.spawn().map_err(|e| DevloopError::ProcessSpawn {
            command: program,
            source: e,
        })
    }
}

impl AssetBuilder for CommandBuilder {
    fn build_all(&mut self, webpack: bool) -> DevloopResult<()> {
        let extra = Self::webpack_args(webpack);
        let plan = self.plan()?.clone();
        let status = plan
            .command(&extra)
            .status()
            .map_err(|e| DevloopError::ProcessSpawn {
                command: plan.program.clone(),
                source: e,
            })?;
        if !status.success() {
            return Err(DevloopError::Build {
                command: plan.describe(&extra),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn spawn_build(
        &mut self,
        action: LogicalAction,
        webpack: bool,
    ) -> DevloopResult<RunningBuild> {
        let mut extra = Vec::new();
        if let Some(id) = action.build_id() {
            extra.push(id.to_string());
        }
        extra.extend(Self::webpack_args(webpack));

        let plan = self.plan()?;
        let child = plan
            .command(&extra)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DevloopError::ProcessSpawn {
                command: plan.program.clone(),
                source: e,
            })?;
        Ok(RunningBuild::spawned(action, child))
    }

    fn reset(&mut self) {
        self.plan = None;
    }
}
