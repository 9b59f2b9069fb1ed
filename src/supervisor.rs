//! Supervised application process
//!
//! Owns the single managed child: spawn it, hard-kill and respawn it on a
//! server reload, push asset notifications onto its stdin in between. No
//! other component holds the handle; at most one child is ever live.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::build::node_env;
use crate::classify::{CompilingMessage, LogicalAction};
use crate::config::Config;
use crate::error::{DevloopError, DevloopResult};

pub struct ProcessSupervisor {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    child: Option<Child>,
}

impl ProcessSupervisor {
    /// Build a supervisor for the configured application command.
    ///
    /// Without the verbose flag the child's log level is pinned to info,
    /// matching what its own tooling expects in development.
    pub fn new(config: &Config, verbose: bool) -> Self {
        let mut args = config.app.args.clone();
        if !verbose {
            args.push("--log-level=info".to_string());
        }
        Self {
            program: config.app.command.clone(),
            args,
            cwd: config.app.root.clone(),
            child: None,
        }
    }

    /// (Re)spawn the application.
    ///
    /// Any previous instance is killed unconditionally and reaped before
    /// the new one is created; there is no graceful drain. Returns the new
    /// child's pid.
    pub fn start(&mut self) -> DevloopResult<u32> {
        if let Some(mut previous) = self.child.take() {
            let _ = previous.kill();
            let _ = previous.wait();
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .env("NODE_ENV", node_env())
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| DevloopError::ProcessSpawn {
                command: self.program.clone(),
                source: e,
            })?;

        let pid = child.id();
        debug!("application started (pid {pid})");
        self.child = Some(child);
        Ok(pid)
    }

    /// Deliver a `{"compiling": ...}` line to the running child.
    ///
    /// No-op when nothing is running. A dead pipe is logged and otherwise
    /// ignored; the next server reload replaces the child anyway.
    pub fn notify(&mut self, action: LogicalAction) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        let Some(stdin) = child.stdin.as_mut() else {
            return;
        };
        let line = CompilingMessage { compiling: action }.to_json();
        if let Err(e) = writeln!(stdin, "{line}") {
            warn!("could not notify application of {action}: {e}");
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Best-effort terminate without respawn; used on overall shutdown.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}
