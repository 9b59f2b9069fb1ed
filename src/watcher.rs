//! Continuous watch and dispatch
//!
//! One dispatcher loop consumes raw file-system notifications, matches
//! them against every watch target, and fires each target after its own
//! quiet interval. Fired targets are classified: five actions spawn an
//! incremental build that is polled without blocking the loop, the sixth
//! resets the build invoker and restarts the supervised process. Failures
//! of a single build are reported and the loop keeps running.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tracing::{debug, error};

use crate::build::{AssetBuilder, RunningBuild};
use crate::classify::{classify, LogicalAction};
use crate::error::{DevloopError, DevloopResult};
use crate::supervisor::ProcessSupervisor;
use crate::targets::{watch_roots, TargetName, WatchTarget};

/// Receive-poll interval for the dispatcher loop
const POLL_MS: u64 = 50;

/// Drain window for the stale events notify emits right after registration
const STARTUP_COOLDOWN_MS: u64 = 500;

/// Watch event types for NDJSON output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DevEvent {
    WatchStarted { targets: usize },
    TargetFired { target: TargetName },
    BuildStarted { action: LogicalAction },
    BuildFinished { action: LogicalAction },
    BuildFailed { action: LogicalAction, message: String },
    Reloading,
    AppStarted { pid: u32 },
    Shutdown,
}

impl DevEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Per-target debounce bookkeeping.
///
/// Each target coalesces its own burst of events; timers are independent,
/// so a storm on one target never delays another.
#[derive(Default)]
pub struct DebounceState {
    pending: HashMap<TargetName, Instant>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change for a target, restarting its quiet interval.
    pub fn mark(&mut self, target: TargetName) {
        self.pending.insert(target, Instant::now());
    }

    /// Targets whose quiet interval has elapsed, in planning order.
    pub fn take_due(&mut self, targets: &[WatchTarget]) -> Vec<TargetName> {
        let mut due = Vec::new();
        for target in targets {
            if let Some(last) = self.pending.get(&target.name) {
                if last.elapsed() >= target.debounce {
                    self.pending.remove(&target.name);
                    due.push(target.name);
                }
            }
        }
        due
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// The system's only dispatch point: classifies fired targets and tracks
/// in-flight builds.
pub struct Dispatcher<'a, B: AssetBuilder, F: Fn(DevEvent)> {
    builder: &'a mut B,
    supervisor: &'a mut ProcessSupervisor,
    in_flight: Vec<RunningBuild>,
    on_event: &'a F,
}

impl<'a, B: AssetBuilder, F: Fn(DevEvent)> Dispatcher<'a, B, F> {
    pub fn new(builder: &'a mut B, supervisor: &'a mut ProcessSupervisor, on_event: &'a F) -> Self {
        Self {
            builder,
            supervisor,
            in_flight: Vec::new(),
            on_event,
        }
    }

    /// Act on one fired target.
    pub fn handle(&mut self, target: TargetName) {
        (self.on_event)(DevEvent::TargetFired { target });

        match classify(target) {
            LogicalAction::ServerReload => {
                (self.on_event)(DevEvent::Reloading);
                self.builder.reset();
                match self.supervisor.start() {
                    Ok(pid) => (self.on_event)(DevEvent::AppStarted { pid }),
                    // no retry: the next server change triggers a fresh spawn
                    Err(e) => error!("application restart failed: {e}"),
                }
            }
            action => {
                (self.on_event)(DevEvent::BuildStarted { action });
                match self.builder.spawn_build(action, false) {
                    Ok(build) => self.in_flight.push(build),
                    Err(e) => {
                        error!("incremental build for {action} failed to start: {e}");
                        (self.on_event)(DevEvent::BuildFailed {
                            action,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Poll in-flight builds; on success the child is notified in place.
    pub fn poll_builds(&mut self) {
        let mut index = 0;
        while index < self.in_flight.len() {
            match self.in_flight[index].try_finish() {
                None => index += 1,
                Some(result) => {
                    let build = self.in_flight.swap_remove(index);
                    match result {
                        Ok(()) => {
                            (self.on_event)(DevEvent::BuildFinished {
                                action: build.action,
                            });
                            self.supervisor.notify(build.action);
                        }
                        Err(message) => {
                            error!("incremental build for {} failed: {message}", build.action);
                            (self.on_event)(DevEvent::BuildFailed {
                                action: build.action,
                                message,
                            });
                        }
                    }
                }
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Watch the planned targets and dispatch until the running flag clears.
///
/// Blocking; the caller installs its own Ctrl+C handling and clears
/// `running` to stop.
pub fn watch<B, F>(
    app_root: &Path,
    targets: &[WatchTarget],
    builder: &mut B,
    supervisor: &mut ProcessSupervisor,
    running: Arc<AtomicBool>,
    on_event: F,
) -> DevloopResult<()>
where
    B: AssetBuilder,
    F: Fn(DevEvent),
{
    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| DevloopError::Watch(e.to_string()))?;

    for root in watch_roots(targets) {
        let abs = app_root.join(&root);
        if abs.exists() {
            watcher
                .watch(&abs, RecursiveMode::Recursive)
                .map_err(|e| DevloopError::Watch(e.to_string()))?;
        } else {
            // patterns may reference paths that do not exist yet
            debug!("skipping watch root (not found): {}", abs.display());
        }
    }

    on_event(DevEvent::WatchStarted {
        targets: targets.len(),
    });

    // notify sometimes emits events for existing files right after the
    // watcher is registered; drain them before dispatching anything
    let cooldown_end = Instant::now() + Duration::from_millis(STARTUP_COOLDOWN_MS);
    while Instant::now() < cooldown_end {
        let _ = rx.recv_timeout(Duration::from_millis(POLL_MS));
    }

    let mut debounce = DebounceState::new();
    let mut dispatcher = Dispatcher::new(builder, supervisor, &on_event);

    while running.load(Ordering::SeqCst) {
        if let Ok(path) = rx.recv_timeout(Duration::from_millis(POLL_MS)) {
            let path = path.canonicalize().unwrap_or(path);
            if let Ok(rel) = path.strip_prefix(app_root) {
                for target in targets {
                    if target.matches(rel) {
                        debounce.mark(target.name);
                    }
                }
            }
        }

        for name in debounce.take_due(targets) {
            dispatcher.handle(name);
        }
        dispatcher.poll_builds();
    }

    on_event(DevEvent::Shutdown);
    Ok(())
}
