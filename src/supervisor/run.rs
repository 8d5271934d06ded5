// src/supervisor/run.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::Timings;
use crate::exec::{Executable, Launcher};
use crate::fs::FileSystem;
use crate::lock::{query_lock_state, LockOracle};
use crate::supervisor::state::{evaluate, RunState};
use crate::types::{LockState, RunOutcome, StopReason};

/// Collaborators shared by every supervised run.
#[derive(Clone)]
pub struct RunContext {
    pub fs: Arc<dyn FileSystem>,
    pub oracle: Arc<dyn LockOracle>,
    pub launcher: Arc<dyn Launcher>,
    pub timings: Timings,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("fs", &self.fs)
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

/// Summary of a finished supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exe: PathBuf,
    pub generation: u64,
    /// Number of times the child was actually spawned.
    pub attempts: u64,
    pub stop: StopReason,
}

/// The retry loop for one executable within one generation.
///
/// Attempts are strictly sequential. Every wait (gate cool-down, backoff,
/// child exit) also watches `cancel`, so superseding the generation stops the
/// run promptly.
pub struct SupervisedRun {
    exe: Executable,
    generation: u64,
    cancel: CancellationToken,
    attempts: u64,
    ctx: Arc<RunContext>,
}

impl SupervisedRun {
    pub fn new(
        exe: Executable,
        generation: u64,
        cancel: CancellationToken,
        ctx: Arc<RunContext>,
    ) -> Self {
        Self {
            exe,
            generation,
            cancel,
            attempts: 0,
            ctx,
        }
    }

    /// Drive the state machine until it stops.
    pub async fn run(mut self) -> RunReport {
        let mut state = RunState::Gating;

        loop {
            trace!(exe = %self.exe, generation = self.generation, ?state, "run state");

            state = match state {
                RunState::Gating => self.gate().await,
                RunState::Running => self.attempt().await,
                RunState::Evaluating(outcome) => self.evaluate(outcome),
                RunState::Retrying(delay) => self.back_off(delay).await,
                RunState::Stopped(stop) => return self.finish(stop),
            };
        }
    }

    async fn gate(&self) -> RunState {
        if !self.ctx.fs.exists(self.exe.path()) {
            return RunState::Stopped(StopReason::Vanished);
        }

        if !self.exe.requires_unlock() {
            return RunState::Running;
        }

        match query_lock_state(self.ctx.oracle.as_ref(), &self.cancel).await {
            None => RunState::Evaluating(RunOutcome::Cancelled),
            Some(LockState::Unlocked) => RunState::Running,
            Some(LockState::Locked) => {
                let until = Instant::now() + self.ctx.timings.gate_cooldown;
                RunState::Evaluating(RunOutcome::GateBlocked { until })
            }
            Some(LockState::Unknown(err)) => {
                warn!(
                    exe = %self.exe,
                    error = %err,
                    "failed to determine if screen is locked; running anyway"
                );
                RunState::Running
            }
        }
    }

    async fn attempt(&mut self) -> RunState {
        // The gate may have spent a while asking the oracle.
        if !self.ctx.fs.exists(self.exe.path()) {
            return RunState::Stopped(StopReason::Vanished);
        }

        self.attempts += 1;
        debug!(
            exe = %self.exe,
            generation = self.generation,
            attempt = self.attempts,
            "executing"
        );

        let outcome = self
            .ctx
            .launcher
            .launch(&self.exe, self.attempts, &self.cancel)
            .await;

        // A child killed because its generation was superseded usually
        // reports a failure; that is not worth a retry.
        let outcome = match outcome {
            RunOutcome::Failed(_) if self.cancel.is_cancelled() => RunOutcome::Cancelled,
            other => other,
        };

        RunState::Evaluating(outcome)
    }

    fn evaluate(&self, outcome: RunOutcome) -> RunState {
        let next = evaluate(&outcome, &self.ctx.timings, Instant::now());

        match (&outcome, &next) {
            (RunOutcome::Failed(reason), RunState::Retrying(delay)) => {
                warn!(
                    exe = %self.exe,
                    attempt = self.attempts,
                    delay_ms = millis(*delay),
                    "exec failed, will retry in {delay:?} - {reason}"
                );
            }
            (RunOutcome::GateBlocked { .. }, RunState::Retrying(delay)) => {
                info!(
                    exe = %self.exe,
                    delay_ms = millis(*delay),
                    "screen is locked, will check again in {delay:?}"
                );
            }
            _ => {}
        }

        next
    }

    async fn back_off(&self, delay: Duration) -> RunState {
        tokio::select! {
            _ = tokio::time::sleep(delay) => RunState::Gating,
            _ = self.cancel.cancelled() => RunState::Stopped(StopReason::Cancelled),
        }
    }

    fn finish(self, stop: StopReason) -> RunReport {
        match stop {
            StopReason::Succeeded => info!(
                exe = %self.exe,
                generation = self.generation,
                attempts = self.attempts,
                "exited successfully"
            ),
            StopReason::Vanished => info!(
                exe = %self.exe,
                generation = self.generation,
                attempts = self.attempts,
                "no longer stat'able; not retrying"
            ),
            StopReason::Cancelled => info!(
                exe = %self.exe,
                generation = self.generation,
                attempts = self.attempts,
                "giving up - generation cancelled"
            ),
        }

        RunReport {
            exe: self.exe.path().to_path_buf(),
            generation: self.generation,
            attempts: self.attempts,
            stop,
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}
