// src/supervisor/state.rs

//! Pure state machine of a supervised run.
//!
//! ```text
//! Gating ──► Running ──► Evaluating ──► Stopped
//!   ▲  │                     │
//!   │  └── GateBlocked ──────┤
//!   │                        ▼
//!   └──────────────────── Retrying
//! ```
//!
//! Nothing in here touches processes, the filesystem or timers; the async
//! shell in [`super::run`] performs the side effects and feeds outcomes back
//! through [`evaluate`].

use std::time::Duration;

use tokio::time::Instant;

use crate::config::Timings;
use crate::types::{RunOutcome, StopReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Check the executable is still present and, if it is lock-gated,
    /// that the session is unlocked.
    Gating,
    /// Spawn the child and wait for it.
    Running,
    /// Classify the outcome of the last gate check or attempt.
    Evaluating(RunOutcome),
    /// Wait this long, then go back to `Gating`.
    Retrying(Duration),
    Stopped(StopReason),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Stopped(_))
    }
}

/// Decide what follows an outcome.
///
/// - success and cancellation end the run;
/// - a blocked gate waits until its `until` instant (relative to `now`);
/// - any failure waits `timings.failure_backoff`.
///
/// There is no attempt ceiling: failures are retried until the
/// executable disappears or the generation is cancelled.
pub fn evaluate(outcome: &RunOutcome, timings: &Timings, now: Instant) -> RunState {
    match outcome {
        RunOutcome::Success => RunState::Stopped(StopReason::Succeeded),
        RunOutcome::Cancelled => RunState::Stopped(StopReason::Cancelled),
        RunOutcome::GateBlocked { until } => {
            RunState::Retrying(until.saturating_duration_since(now))
        }
        RunOutcome::Failed(_) => RunState::Retrying(timings.failure_backoff),
    }
}
