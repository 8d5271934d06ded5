// tests/wake_end_to_end.rs
#![cfg(unix)]

mod common;
use crate::common::{config_for, fast_timings, init_tracing, wait_until, with_timeout};

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use waked::config::Timings;
use waked::dispatch::WakeDispatcher;
use waked::exec::ProcessLauncher;
use waked::fs::RealFileSystem;
use waked::lock::{CommandLockOracle, HelperCommand, LockOracle};
use waked::supervisor::{RunContext, RunReport};
use waked::types::StopReason;
use waked_test_utils::{write_script, LogCapture, OracleAnswer, RecordingSink, ScriptedOracle};

type TestResult = Result<(), Box<dyn Error>>;

fn real_dispatcher(
    dir: &Path,
    oracle: impl LockOracle + 'static,
    sink: RecordingSink,
    timings: Timings,
) -> (Arc<WakeDispatcher>, mpsc::UnboundedReceiver<RunReport>, CancellationToken) {
    let ctx = RunContext {
        fs: Arc::new(RealFileSystem),
        oracle: Arc::new(oracle),
        launcher: Arc::new(ProcessLauncher::new(timings, Arc::new(sink))),
        timings,
    };
    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let dispatcher = WakeDispatcher::new(&config_for(dir, timings), Arc::new(ctx), shutdown.clone())
        .with_reports(tx);
    (Arc::new(dispatcher), rx, shutdown)
}

fn read_log(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn always_ok_runs_once_and_flaky_gated_runs_twice() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let state = TempDir::new()?;
    let flag = state.path().join("b-ran-before");

    write_script(dir.path(), "a", "echo a ran")?;
    write_script(
        dir.path(),
        "b-on-unlock",
        &format!(
            "if [ -e \"{flag}\" ]; then echo second; exit 0; fi\ntouch \"{flag}\"\necho first\nexit 1",
            flag = flag.display()
        ),
    )?;
    fs::create_dir(dir.path().join("ignored-dir"))?;

    let sink = RecordingSink::new();
    let (dispatcher, mut reports, _shutdown) = real_dispatcher(
        dir.path(),
        ScriptedOracle::new(OracleAnswer::Unlocked),
        sink.clone(),
        fast_timings(),
    );

    let wake = dispatcher.on_wake_event().await.expect("listing succeeds");
    assert_eq!(wake.started.len(), 2);

    let mut by_name = HashMap::new();
    for _ in 0..2 {
        let report = with_timeout(reports.recv()).await.expect("report");
        let name = report
            .exe
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        by_name.insert(name, report);
    }

    assert_eq!(by_name["a"].attempts, 1);
    assert_eq!(by_name["a"].stop, StopReason::Succeeded);
    assert_eq!(by_name["b-on-unlock"].attempts, 2);
    assert_eq!(by_name["b-on-unlock"].stop, StopReason::Succeeded);

    let b_lines: Vec<_> = sink
        .lines()
        .into_iter()
        .filter(|(exe, _, _)| exe.ends_with("b-on-unlock"))
        .map(|(_, _, line)| line)
        .collect();
    assert_eq!(b_lines, vec!["first", "second"]);

    Ok(())
}

#[tokio::test]
async fn second_wake_terminates_first_generation_child_before_restarting() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let state = TempDir::new()?;
    let log = state.path().join("c.log");

    write_script(
        dir.path(),
        "c",
        &format!(
            "trap 'echo term >> \"{log}\"; exit 0' TERM\necho start >> \"{log}\"\nwhile :; do sleep 0.05; done",
            log = log.display()
        ),
    )?;

    let (dispatcher, mut reports, shutdown) = real_dispatcher(
        dir.path(),
        ScriptedOracle::new(OracleAnswer::Unlocked),
        RecordingSink::new(),
        fast_timings(),
    );

    dispatcher.on_wake_event().await.expect("first wake");
    wait_until("first c running", || read_log(&log).len() == 1).await;

    dispatcher.on_wake_event().await.expect("second wake");
    wait_until("second c running", || read_log(&log).len() == 3).await;

    assert_eq!(read_log(&log), vec!["start", "term", "start"]);

    let first = reports.try_recv().expect("first generation finished during the swap");
    assert_eq!(first.generation, 1);
    assert_eq!(first.stop, StopReason::Cancelled);

    shutdown.cancel();
    let second = with_timeout(reports.recv()).await.expect("report");
    assert_eq!(second.generation, 2);
    assert_eq!(second.stop, StopReason::Cancelled);

    Ok(())
}

#[tokio::test]
async fn failing_lock_helpers_let_gated_executable_run() -> TestResult {
    let (logs, _guard) = LogCapture::install();

    let dir = TempDir::new()?;
    write_script(dir.path(), "notify-on-unlock", "echo ran")?;

    let failing = HelperCommand::new("/bin/sh", ["-c", "echo boom >&2; exit 1"]);
    let oracle = CommandLockOracle::new(failing.clone(), failing, "ScreenIsLocked");

    let sink = RecordingSink::new();
    let (dispatcher, mut reports, _shutdown) =
        real_dispatcher(dir.path(), oracle, sink.clone(), fast_timings());

    dispatcher.on_wake_event().await.expect("wake");
    let report = with_timeout(reports.recv()).await.expect("report");

    assert_eq!(report.stop, StopReason::Succeeded);
    assert_eq!(report.attempts, 1);
    assert_eq!(sink.lines().len(), 1);
    assert_eq!(sink.lines()[0].2, "ran");

    let warnings = logs.matching(Level::WARN, "running anyway");
    assert_eq!(warnings.len(), 1, "{warnings:#?}");
    assert!(warnings[0].contains("boom"), "helper output is kept: {}", warnings[0]);

    Ok(())
}

#[tokio::test]
async fn deleting_a_failing_executable_ends_its_run() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let path = write_script(dir.path(), "broken", "exit 1")?;

    let sink = RecordingSink::new();
    let (dispatcher, mut reports, _shutdown) =
        real_dispatcher(dir.path(), ScriptedOracle::new(OracleAnswer::Unlocked), sink, fast_timings());

    dispatcher.on_wake_event().await.expect("wake");
    tokio::time::sleep(fast_timings().failure_backoff / 2).await;
    fs::remove_file(&path)?;

    let report = with_timeout(reports.recv()).await.expect("report");
    assert_eq!(report.stop, StopReason::Vanished);
    assert!(report.attempts >= 1);

    Ok(())
}
