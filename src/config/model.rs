// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory scanned for executables when none is given on the command line.
pub const DEFAULT_EXES_DIR: &str = "/usr/local/etc/waked";

/// Base-name substring that marks an executable as lock-gated.
pub const DEFAULT_UNLOCK_MARKER: &str = "-on-unlock";

/// Retry and termination timings used by every supervised run.
///
/// The defaults are what the daemon uses in production; tests shrink them
/// to keep wall-clock time down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait after a failed attempt (non-zero exit, timeout, spawn error).
    pub failure_backoff: Duration,
    /// Wait after the gate reported the session as locked.
    pub gate_cooldown: Duration,
    /// Hard ceiling on a single child invocation.
    pub attempt_timeout: Duration,
    /// Time between SIGTERM and SIGKILL when stopping a child.
    pub kill_grace: Duration,
    /// How long a new generation waits for the superseded one to wind down.
    pub generation_drain: Duration,
    /// How long output readers may keep draining after the child is gone.
    pub capture_close_grace: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            failure_backoff: Duration::from_secs(10),
            gate_cooldown: Duration::from_secs(5),
            attempt_timeout: Duration::from_secs(10 * 60),
            kill_grace: Duration::from_secs(3),
            generation_drain: Duration::from_secs(5),
            capture_close_grace: Duration::from_secs(1),
        }
    }
}

/// Settings as supplied by the user, before validation.
#[derive(Debug, Clone)]
pub struct RawSupervisorConfig {
    pub exes_dir: PathBuf,
    pub unlock_marker: String,
    pub timings: Timings,
}

impl Default for RawSupervisorConfig {
    fn default() -> Self {
        Self {
            exes_dir: PathBuf::from(DEFAULT_EXES_DIR),
            unlock_marker: DEFAULT_UNLOCK_MARKER.to_string(),
            timings: Timings::default(),
        }
    }
}

/// Validated supervisor settings.
///
/// Only obtainable through `TryFrom<RawSupervisorConfig>`, so holders can
/// rely on a non-empty, cleaned directory path and a non-empty marker.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    exes_dir: PathBuf,
    unlock_marker: String,
    timings: Timings,
}

impl SupervisorConfig {
    pub(crate) fn new_unchecked(exes_dir: PathBuf, unlock_marker: String, timings: Timings) -> Self {
        Self {
            exes_dir,
            unlock_marker,
            timings,
        }
    }

    pub fn exes_dir(&self) -> &Path {
        &self.exes_dir
    }

    pub fn unlock_marker(&self) -> &str {
        &self.unlock_marker
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }
}
