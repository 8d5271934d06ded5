use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;

/// Boxed future used at the trait seams (`Launcher`, `LockOracle`) so the
/// traits stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Why a single attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The child exited with a non-zero status code.
    ExitCode(i32),
    /// The child was terminated by a signal it did not ask for.
    Signal(i32),
    /// The child was still running when the attempt timeout fired.
    TimedOut(Duration),
    /// The child could not be spawned or waited on (missing, not
    /// executable, permission denied, ...).
    Spawn(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ExitCode(code) => write!(f, "exit status {code}"),
            FailureReason::Signal(sig) => write!(f, "terminated by signal {sig}"),
            FailureReason::TimedOut(after) => {
                write!(f, "timed-out waiting for child process to exit after {after:?}")
            }
            FailureReason::Spawn(msg) => write!(f, "failed to start - {msg}"),
        }
    }
}

/// Result of one pass through the gate and (possibly) one child invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed(FailureReason),
    /// The session was locked; the gate may be retried at `until`.
    GateBlocked { until: Instant },
    Cancelled,
}

/// Why a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The child exited zero.
    Succeeded,
    /// The executable could no longer be stat'ed.
    Vanished,
    /// The owning generation was cancelled.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Succeeded => "succeeded",
            StopReason::Vanished => "vanished",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Point-in-time answer of the lock-state oracle.
///
/// `Unknown` carries the oracle error message; callers treat it as
/// unlocked and log a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocked,
    Unknown(String),
}

/// Which child stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}
