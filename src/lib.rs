// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod lock;
pub mod logging;
pub mod signals;
pub mod supervisor;
pub mod types;
pub mod wake;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::{config_from_args, SupervisorConfig};
use crate::dispatch::WakeDispatcher;
use crate::errors::{Result, WakedError};
use crate::exec::{LineSink, ProcessLauncher, TracingLineSink};
use crate::fs::RealFileSystem;
use crate::lock::CommandLockOracle;
use crate::supervisor::RunContext;
use crate::wake::{pump_wake_events, spawn_clock_jump_source, WakeEvent, DEFAULT_SLEEP_THRESHOLD};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config validation (the only fatal error besides signals)
/// - the real filesystem, lock oracle and process launcher
/// - the wake dispatcher and its resume-event sources
/// - termination signal handling
///
/// Runs until a termination signal arrives, then returns
/// [`WakedError::Shutdown`] without draining in-flight children.
pub async fn run(args: CliArgs) -> Result<()> {
    let config = config_from_args(&args)?;

    info!(
        dir = %config.exes_dir().display(),
        unlock_marker = %config.unlock_marker(),
        "waked starting"
    );

    let shutdown = CancellationToken::new();
    let dispatcher = Arc::new(production_dispatcher(&config, shutdown.clone()));

    let (wake_tx, wake_rx) = mpsc::channel::<WakeEvent>(16);

    let _clock = spawn_clock_jump_source(
        Duration::from_secs(args.clock_poll_secs.max(1)),
        DEFAULT_SLEEP_THRESHOLD,
        wake_tx.clone(),
    );

    #[cfg(unix)]
    let _usr1 = crate::wake::spawn_signal_source(wake_tx.clone())?;

    if args.run_at_start {
        wake_tx
            .send(WakeEvent::Startup)
            .await
            .map_err(|e| WakedError::Other(anyhow::anyhow!("queueing startup event: {e}")))?;
    }
    drop(wake_tx);

    tokio::spawn(pump_wake_events(wake_rx, dispatcher));

    let signal = crate::signals::wait_for_shutdown_signal().await?;
    error!(signal, "received termination signal; exiting");
    shutdown.cancel();

    Err(WakedError::Shutdown(signal.to_string()))
}

/// Build a dispatcher backed by the real filesystem, `ioreg`/`plutil` lock
/// helpers and real child processes whose output goes to `tracing`.
pub fn production_dispatcher(config: &SupervisorConfig, shutdown: CancellationToken) -> WakeDispatcher {
    let timings = config.timings();
    let sink: Arc<dyn LineSink> = Arc::new(TracingLineSink);

    let ctx = RunContext {
        fs: Arc::new(RealFileSystem),
        oracle: Arc::new(CommandLockOracle::macos()),
        launcher: Arc::new(ProcessLauncher::new(timings, sink)),
        timings,
    };

    WakeDispatcher::new(config, Arc::new(ctx), shutdown)
}
