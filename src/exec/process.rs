// src/exec/process.rs

//! One child invocation.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Timings;
use crate::exec::capture::{LineSink, OutputCapture};
use crate::exec::executable::Executable;
use crate::types::{FailureReason, OutputStream, RunOutcome};

/// Run `exe` once, with no arguments, until it exits, the attempt timeout
/// fires, or `cancel` is triggered, whichever happens first.
///
/// Stdout and stderr are forwarded line by line to `sink`; stdin is
/// `/dev/null`. On timeout or cancellation the child is asked to stop with
/// SIGTERM and killed after `timings.kill_grace`. Both output captures are
/// closed on every path before returning.
pub async fn run_attempt(
    exe: &Executable,
    attempt: u64,
    cancel: &CancellationToken,
    timings: &Timings,
    sink: Arc<dyn LineSink>,
) -> RunOutcome {
    let mut cmd = Command::new(exe.path());
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return RunOutcome::Failed(FailureReason::Spawn(err.to_string())),
    };

    debug!(exe = %exe, attempt, pid = child.id(), "child process started");

    let stdout = child
        .stdout
        .take()
        .map(|out| OutputCapture::attach(exe.path(), OutputStream::Stdout, out, sink.clone()));
    let stderr = child
        .stderr
        .take()
        .map(|err| OutputCapture::attach(exe.path(), OutputStream::Stderr, err, sink.clone()));

    let outcome = tokio::select! {
        status_res = child.wait() => classify_exit(status_res),

        _ = tokio::time::sleep(timings.attempt_timeout) => {
            warn!(
                exe = %exe,
                attempt,
                timeout_ms = timings.attempt_timeout.as_millis() as u64,
                "child process exceeded attempt timeout; terminating"
            );
            terminate(&mut child, exe, timings.kill_grace).await;
            RunOutcome::Failed(FailureReason::TimedOut(timings.attempt_timeout))
        }

        _ = cancel.cancelled() => {
            debug!(exe = %exe, attempt, "terminating child process of cancelled generation");
            terminate(&mut child, exe, timings.kill_grace).await;
            RunOutcome::Cancelled
        }
    };

    let mut lines = 0;
    if let Some(capture) = stdout {
        lines += capture.close(timings.capture_close_grace).await;
    }
    if let Some(capture) = stderr {
        lines += capture.close(timings.capture_close_grace).await;
    }
    debug!(exe = %exe, attempt, lines, ?outcome, "child process finished");

    outcome
}

fn classify_exit(status_res: io::Result<ExitStatus>) -> RunOutcome {
    let status = match status_res {
        Ok(status) => status,
        Err(err) => {
            return RunOutcome::Failed(FailureReason::Spawn(format!(
                "waiting for child process - {err}"
            )));
        }
    };

    if status.success() {
        return RunOutcome::Success;
    }

    if let Some(code) = status.code() {
        return RunOutcome::Failed(FailureReason::ExitCode(code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return RunOutcome::Failed(FailureReason::Signal(sig));
        }
    }

    RunOutcome::Failed(FailureReason::ExitCode(-1))
}

/// Ask the child to stop, then force it.
async fn terminate(child: &mut Child, exe: &Executable, grace: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => {
                if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
                    debug!(exe = %exe, ?status, "child process exited after SIGTERM");
                    return;
                }
                debug!(
                    exe = %exe,
                    grace_ms = grace.as_millis() as u64,
                    "child ignored SIGTERM; killing"
                );
            }
            Err(err) => {
                debug!(exe = %exe, error = %err, "failed to send SIGTERM; killing");
            }
        }
    }

    if let Err(err) = child.kill().await {
        warn!(exe = %exe, error = %err, "failed to kill child process");
    }
}
