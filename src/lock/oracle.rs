// src/lock/oracle.rs

use std::ffi::OsString;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::errors::{Result, WakedError};
use crate::types::{BoxFuture, LockState};

/// Answers whether the interactive session is locked.
pub trait LockOracle: Send + Sync {
    /// `Ok(true)` when locked, `Ok(false)` when not, `Err` when unknown.
    ///
    /// Must return [`WakedError::Cancelled`] promptly once `cancel` fires,
    /// tearing down any helper process still running.
    fn is_locked<'a>(&'a self, cancel: &'a CancellationToken) -> BoxFuture<'a, Result<bool>>;
}

/// Query `oracle` and fold the result into a [`LockState`].
///
/// Cancellation is reported as `None` so callers can stop instead of
/// treating it as an oracle failure.
pub async fn query_lock_state(
    oracle: &dyn LockOracle,
    cancel: &CancellationToken,
) -> Option<LockState> {
    match oracle.is_locked(cancel).await {
        Ok(true) => Some(LockState::Locked),
        Ok(false) => Some(LockState::Unlocked),
        Err(err) if err.is_cancelled() => None,
        Err(err) => Some(LockState::Unknown(err.to_string())),
    }
}

/// An external program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl HelperCommand {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn display(&self) -> String {
        let mut out = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}

/// Session property that is only present while a console user exists.
const SCREEN_LOCKED_KEY: &str = "CGSSessionScreenIsLocked";

/// Oracle backed by two chained helper commands.
///
/// The `probe` dumps session/console state. If `marker` does not occur in
/// that dump the session cannot be locked and no second command runs.
/// Otherwise the dump is piped into `extract`, whose trimmed output is
/// compared literally with `true`.
#[derive(Debug, Clone)]
pub struct CommandLockOracle {
    probe: HelperCommand,
    extract: HelperCommand,
    marker: String,
}

impl CommandLockOracle {
    pub fn new(probe: HelperCommand, extract: HelperCommand, marker: impl Into<String>) -> Self {
        Self {
            probe,
            extract,
            marker: marker.into(),
        }
    }

    /// The macOS helpers: `ioreg` for the console state dump and `plutil`
    /// to pull the screen-lock flag out of it.
    pub fn macos() -> Self {
        Self::new(
            HelperCommand::new("/usr/sbin/ioreg", ["-n", "Root", "-d1", "-a"]),
            HelperCommand::new(
                "/usr/bin/plutil",
                [
                    "-extract".to_string(),
                    format!("IOConsoleUsers.0.{SCREEN_LOCKED_KEY}"),
                    "raw".to_string(),
                    "-".to_string(),
                ],
            ),
            SCREEN_LOCKED_KEY,
        )
    }

    async fn check(&self) -> Result<bool> {
        let dump = run_helper(&self.probe, None).await?;

        if !contains(&dump, self.marker.as_bytes()) {
            trace!(marker = %self.marker, "lock marker absent from probe output");
            return Ok(false);
        }

        let raw = run_helper(&self.extract, Some(&dump)).await?;
        let value = raw.trim_ascii();
        debug!(value = %String::from_utf8_lossy(value), "lock state extracted");

        Ok(value == b"true")
    }
}

impl LockOracle for CommandLockOracle {
    fn is_locked<'a>(&'a self, cancel: &'a CancellationToken) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            // Dropping `check()` drops the in-flight `Child`; `kill_on_drop`
            // tears the helper down.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(WakedError::Cancelled),
                res = self.check() => res,
            }
        })
    }
}

/// Run one helper to completion and return its stdout.
///
/// A non-zero exit is an error carrying the combined output for context.
async fn run_helper(helper: &HelperCommand, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut cmd = Command::new(&helper.program);
    cmd.args(&helper.args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let failed = |detail: String| WakedError::HelperFailed {
        program: helper.display(),
        detail,
    };

    let mut child = cmd.spawn().map_err(|e| failed(format!("spawn: {e}")))?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        // The helper may fill its stdout before it has read all of stdin.
        let input = input.to_vec();
        tokio::spawn(async move {
            let _ = pipe.write_all(&input).await;
            let _ = pipe.shutdown().await;
        });
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| failed(format!("wait: {e}")))?;

    if !output.status.success() {
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        return Err(failed(format!(
            "{} - output: {:?}",
            output.status,
            String::from_utf8_lossy(&combined)
        )));
    }

    Ok(output.stdout)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
