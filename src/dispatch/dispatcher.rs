// src/dispatch/dispatcher.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SupervisorConfig;
use crate::dispatch::generation::Generation;
use crate::exec::Executable;
use crate::supervisor::{RunContext, RunReport};

/// What a resume event started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeReport {
    pub generation: u64,
    pub started: Vec<Executable>,
}

#[derive(Debug, Default)]
struct DispatcherState {
    current: Option<Generation>,
    last_id: u64,
}

/// Reacts to resume events by replacing the active generation.
///
/// `on_wake_event` may be called concurrently; the listing and generation
/// swap happen under one async mutex. Runs already started are not affected
/// by that lock.
pub struct WakeDispatcher {
    exes_dir: PathBuf,
    unlock_marker: String,
    shutdown: CancellationToken,
    ctx: Arc<RunContext>,
    reports: Option<mpsc::UnboundedSender<RunReport>>,
    state: Mutex<DispatcherState>,
}

impl fmt::Debug for WakeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeDispatcher")
            .field("exes_dir", &self.exes_dir)
            .field("unlock_marker", &self.unlock_marker)
            .finish_non_exhaustive()
    }
}

impl WakeDispatcher {
    /// Create a dispatcher whose generations are children of `shutdown`.
    pub fn new(config: &SupervisorConfig, ctx: Arc<RunContext>, shutdown: CancellationToken) -> Self {
        Self {
            exes_dir: config.exes_dir().to_path_buf(),
            unlock_marker: config.unlock_marker().to_string(),
            shutdown,
            ctx,
            reports: None,
            state: Mutex::new(DispatcherState::default()),
        }
    }

    /// Send the report of every finished supervised run to `tx`.
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<RunReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Handle one resume event.
    ///
    /// 1. List the executables directory (failure drops the event and leaves
    ///    the active generation untouched).
    /// 2. Cancel the active generation and wait, bounded by
    ///    `timings.generation_drain`, for its children to be stopped.
    /// 3. Start a new generation with one supervised run per non-directory
    ///    entry.
    ///
    /// Returns `None` when the event was dropped.
    pub async fn on_wake_event(&self) -> Option<WakeReport> {
        let mut state = self.state.lock().await;

        let entries = match self.ctx.fs.read_dir(&self.exes_dir) {
            Ok(entries) => entries,
            Err(err) => {
                error!(
                    dir = %self.exes_dir.display(),
                    error = %format!("{err:#}"),
                    "failed to read executables directory"
                );
                return None;
            }
        };

        if let Some(previous) = state.current.take() {
            info!(generation = previous.id(), "received new wake event; stopping previous generation");
            previous.cancel();
            previous.drain(self.ctx.timings.generation_drain).await;
        }

        state.last_id += 1;
        let generation = Generation::new(state.last_id, &self.shutdown);

        let mut started = Vec::new();
        for entry in entries {
            if entry.is_dir {
                debug!(path = %entry.path.display(), "skipping directory");
                continue;
            }

            let exe = Executable::new(entry.path, &self.unlock_marker);
            generation.spawn_run(exe.clone(), Arc::clone(&self.ctx), self.reports.clone());
            started.push(exe);
        }

        info!(
            generation = generation.id(),
            executables = started.len(),
            "started generation"
        );

        let report = WakeReport {
            generation: generation.id(),
            started,
        };
        state.current = Some(generation);
        Some(report)
    }

    /// Id of the active generation, if any resume event has been handled.
    pub async fn current_generation(&self) -> Option<u64> {
        self.state.lock().await.current.as_ref().map(Generation::id)
    }
}
