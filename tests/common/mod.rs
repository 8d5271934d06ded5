#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use waked::config::{RawSupervisorConfig, SupervisorConfig, Timings};
use waked::exec::Launcher;
use waked::fs::FileSystem;
use waked::lock::LockOracle;
use waked::supervisor::RunContext;

#[allow(unused_imports)]
pub use waked_test_utils::{init_tracing, wait_until, with_timeout};

/// Timings short enough for tests while keeping every wait distinct.
pub fn fast_timings() -> Timings {
    Timings {
        failure_backoff: Duration::from_millis(200),
        gate_cooldown: Duration::from_millis(100),
        attempt_timeout: Duration::from_secs(5),
        kill_grace: Duration::from_millis(500),
        generation_drain: Duration::from_secs(2),
        capture_close_grace: Duration::from_millis(500),
    }
}

pub fn context(
    fs: impl FileSystem + 'static,
    oracle: impl LockOracle + 'static,
    launcher: impl Launcher + 'static,
    timings: Timings,
) -> Arc<RunContext> {
    Arc::new(RunContext {
        fs: Arc::new(fs),
        oracle: Arc::new(oracle),
        launcher: Arc::new(launcher),
        timings,
    })
}

pub fn config_for(dir: &Path, timings: Timings) -> SupervisorConfig {
    SupervisorConfig::try_from(RawSupervisorConfig {
        exes_dir: dir.to_path_buf(),
        timings,
        ..RawSupervisorConfig::default()
    })
    .expect("test config must be valid")
}
