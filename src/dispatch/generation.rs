// src/dispatch/generation.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::exec::Executable;
use crate::supervisor::{RunContext, RunReport, SupervisedRun};

/// The cohort of supervised runs started by one resume event.
///
/// Owns the cancellation scope every run (and every child process and
/// oracle query within it) inherits, plus a tracker to wait for the runs to
/// wind down after cancellation.
#[derive(Debug)]
pub struct Generation {
    id: u64,
    token: CancellationToken,
    runs: TaskTracker,
}

impl Generation {
    /// Create generation `id` whose scope is a child of `parent`.
    pub fn new(id: u64, parent: &CancellationToken) -> Self {
        Self {
            id,
            token: parent.child_token(),
            runs: TaskTracker::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Start a supervised run for `exe` under this generation.
    ///
    /// The finished run's report is sent to `reports` if one is given.
    pub fn spawn_run(
        &self,
        exe: Executable,
        ctx: Arc<RunContext>,
        reports: Option<mpsc::UnboundedSender<RunReport>>,
    ) {
        let run = SupervisedRun::new(exe, self.id, self.token.clone(), ctx);
        self.runs.spawn(async move {
            let report = run.run().await;
            if let Some(tx) = reports {
                let _ = tx.send(report);
            }
        });
    }

    /// Request termination of every run and child in this generation.
    pub fn cancel(&self) {
        self.token.cancel();
        self.runs.close();
    }

    /// Wait up to `timeout` for the runs of a cancelled generation to finish.
    ///
    /// Returns `false` if some were still running when the timeout expired.
    pub async fn drain(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.runs.wait()).await {
            Ok(()) => {
                debug!(generation = self.id, "generation drained");
                true
            }
            Err(_) => {
                warn!(
                    generation = self.id,
                    remaining = self.runs.len(),
                    "superseded generation still winding down"
                );
                false
            }
        }
    }
}
