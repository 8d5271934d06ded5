use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use waked::errors::{Result, WakedError};
use waked::exec::{Executable, Launcher, LineSink};
use waked::lock::LockOracle;
use waked::types::{BoxFuture, FailureReason, OutputStream, RunOutcome};

/// A line sink that just remembers everything it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<(String, OutputStream, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(exe path, stream, line)` triples in arrival order.
    pub fn lines(&self) -> Vec<(String, OutputStream, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines of one stream, in order.
    pub fn stream(&self, stream: OutputStream) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s, _)| *s == stream)
            .map(|(_, _, l)| l.clone())
            .collect()
    }
}

impl LineSink for RecordingSink {
    fn line(&self, exe: &Path, stream: OutputStream, line: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((exe.display().to_string(), stream, line.to_string()));
    }
}

/// What one scripted attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeAttempt {
    Succeed,
    Fail(i32),
    /// Block until the generation is cancelled.
    Hang,
}

/// One recorded launch.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub name: String,
    pub attempt: u64,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct LauncherState {
    scripts: HashMap<String, VecDeque<FakeAttempt>>,
    launches: Vec<LaunchRecord>,
    active: HashMap<String, usize>,
    overlaps: Vec<String>,
}

/// A fake launcher that:
/// - plays back a per-executable script of attempts (keyed by file name),
///   succeeding once the script is exhausted
/// - records every launch
/// - notes any launch that starts while another one for the same name is
///   still in flight.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncher {
    state: Arc<Mutex<LauncherState>>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, name: &str, attempts: impl IntoIterator<Item = FakeAttempt>) {
        let mut state = self.state.lock().unwrap();
        state
            .scripts
            .entry(name.to_string())
            .or_default()
            .extend(attempts);
    }

    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.state.lock().unwrap().launches.clone()
    }

    pub fn launch_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .launches
            .iter()
            .filter(|l| l.name == name)
            .count()
    }

    pub fn overlaps(&self) -> Vec<String> {
        self.state.lock().unwrap().overlaps.clone()
    }
}

impl Launcher for ScriptedLauncher {
    fn launch<'a>(
        &'a self,
        exe: &'a Executable,
        attempt: u64,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, RunOutcome> {
        let name = exe
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let step = {
            let mut state = self.state.lock().unwrap();
            let step = state
                .scripts
                .get_mut(&name)
                .and_then(VecDeque::pop_front)
                .unwrap_or(FakeAttempt::Succeed);

            let active = state.active.entry(name.clone()).or_insert(0);
            *active += 1;
            if *active > 1 {
                state.overlaps.push(name.clone());
            }

            state.launches.push(LaunchRecord {
                name: name.clone(),
                attempt,
                at: Instant::now(),
            });
            step
        };

        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let outcome = match step {
                FakeAttempt::Succeed => RunOutcome::Success,
                FakeAttempt::Fail(code) => RunOutcome::Failed(FailureReason::ExitCode(code)),
                FakeAttempt::Hang => {
                    cancel.cancelled().await;
                    RunOutcome::Cancelled
                }
            };

            if let Some(active) = state.lock().unwrap().active.get_mut(&name) {
                *active -= 1;
            }
            outcome
        })
    }
}

/// Fixed answer for [`ScriptedOracle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleAnswer {
    Locked,
    Unlocked,
    Fail,
}

/// A lock oracle whose answer the test controls.
#[derive(Debug, Clone)]
pub struct ScriptedOracle {
    answer: Arc<Mutex<OracleAnswer>>,
    queries: Arc<Mutex<usize>>,
}

impl ScriptedOracle {
    pub fn new(answer: OracleAnswer) -> Self {
        Self {
            answer: Arc::new(Mutex::new(answer)),
            queries: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set(&self, answer: OracleAnswer) {
        *self.answer.lock().unwrap() = answer;
    }

    pub fn queries(&self) -> usize {
        *self.queries.lock().unwrap()
    }
}

impl LockOracle for ScriptedOracle {
    fn is_locked<'a>(&'a self, cancel: &'a CancellationToken) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(WakedError::Cancelled);
            }
            *self.queries.lock().unwrap() += 1;
            match *self.answer.lock().unwrap() {
                OracleAnswer::Locked => Ok(true),
                OracleAnswer::Unlocked => Ok(false),
                OracleAnswer::Fail => Err(WakedError::HelperFailed {
                    program: "scripted-oracle".to_string(),
                    detail: "exit status: 1".to_string(),
                }),
            }
        })
    }
}
