// src/exec/backend.rs

//! Pluggable launcher abstraction.
//!
//! Supervised runs start their executable through a `Launcher` instead of
//! spawning processes directly. Production code uses [`ProcessLauncher`];
//! tests substitute a scripted launcher that records invocations and returns
//! canned outcomes without touching the OS.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Timings;
use crate::exec::capture::LineSink;
use crate::exec::executable::Executable;
use crate::exec::process::run_attempt;
use crate::types::{BoxFuture, RunOutcome};

/// Trait abstracting how a single attempt of an executable is performed.
pub trait Launcher: Send + Sync {
    /// Invoke `exe` once and report how it ended.
    ///
    /// Implementations must return [`RunOutcome::Cancelled`] promptly once
    /// `cancel` fires, after making sure the child has been told to stop.
    /// They never return `GateBlocked`.
    fn launch<'a>(
        &'a self,
        exe: &'a Executable,
        attempt: u64,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, RunOutcome>;
}

/// Launcher that spawns real child processes.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    timings: Timings,
    sink: Arc<dyn LineSink>,
}

impl ProcessLauncher {
    pub fn new(timings: Timings, sink: Arc<dyn LineSink>) -> Self {
        Self { timings, sink }
    }
}

impl Launcher for ProcessLauncher {
    fn launch<'a>(
        &'a self,
        exe: &'a Executable,
        attempt: u64,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, RunOutcome> {
        Box::pin(run_attempt(exe, attempt, cancel, &self.timings, self.sink.clone()))
    }
}
