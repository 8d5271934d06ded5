// tests/wake_sources.rs
mod common;
use crate::common::{config_for, context, fast_timings, init_tracing, wait_until, with_timeout};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use waked::dispatch::WakeDispatcher;
use waked::fs::mock::MockFileSystem;
use waked::wake::{detect_sleep_gap, pump_wake_events, spawn_clock_jump_source, WakeEvent};
use waked_test_utils::{OracleAnswer, ScriptedLauncher, ScriptedOracle};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn sleep_gap_requires_wall_clock_to_outrun_monotonic_clock() {
    let threshold = Duration::from_secs(15);

    assert_eq!(
        detect_sleep_gap(Duration::from_secs(3602), Duration::from_secs(2), threshold),
        Some(Duration::from_secs(3600))
    );
    assert_eq!(
        detect_sleep_gap(Duration::from_secs(12), Duration::from_secs(2), threshold),
        None
    );
    // Wall clock slower than monotonic (clock stepped back) is not a sleep.
    assert_eq!(
        detect_sleep_gap(Duration::from_secs(1), Duration::from_secs(2), threshold),
        None
    );
}

#[tokio::test]
async fn clock_source_stays_quiet_without_a_sleep() -> TestResult {
    init_tracing();

    let (tx, mut rx) = mpsc::channel(4);
    let handle = spawn_clock_jump_source(Duration::from_millis(20), Duration::from_secs(15), tx);

    let res = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(res.is_err(), "no resume expected, got {res:?}");

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn pump_hands_every_event_to_the_dispatcher() -> TestResult {
    init_tracing();

    let dir = "/mock/waked";
    let fs = MockFileSystem::new();
    fs.add_file(format!("{dir}/job"));

    let launcher = ScriptedLauncher::new();
    let timings = fast_timings();
    let ctx = context(fs, ScriptedOracle::new(OracleAnswer::Unlocked), launcher.clone(), timings);
    let dispatcher = Arc::new(WakeDispatcher::new(
        &config_for(Path::new(dir), timings),
        ctx,
        CancellationToken::new(),
    ));

    let (tx, rx) = mpsc::channel(4);
    let pump = tokio::spawn(pump_wake_events(rx, Arc::clone(&dispatcher)));

    tx.send(WakeEvent::Startup).await?;
    wait_until("job ran on startup", || launcher.launch_count("job") == 1).await;

    tx.send(WakeEvent::ClockJump { slept: Duration::from_secs(60) }).await?;
    drop(tx);

    with_timeout(pump).await?;
    assert_eq!(dispatcher.current_generation().await, Some(2));
    wait_until("job ran again after resume", || launcher.launch_count("job") == 2).await;

    Ok(())
}
