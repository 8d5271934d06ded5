// tests/lock_oracle.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use waked::errors::WakedError;
use waked::lock::{query_lock_state, CommandLockOracle, HelperCommand, LockOracle};
use waked::types::LockState;
use waked_test_utils::{OracleAnswer, ScriptedOracle};

type TestResult = Result<(), Box<dyn Error>>;

const MARKER: &str = "ScreenIsLocked";

fn sh(script: &str) -> HelperCommand {
    HelperCommand::new("/bin/sh", ["-c", script])
}

fn oracle(probe: &str, extract: &str) -> CommandLockOracle {
    CommandLockOracle::new(sh(probe), sh(extract), MARKER)
}

#[tokio::test]
async fn absent_marker_short_circuits_to_unlocked() -> TestResult {
    init_tracing();

    // The extract helper would fail if it ran.
    let oracle = oracle("echo 'Root { Console = 1 }'", "exit 1");
    assert!(!oracle.is_locked(&CancellationToken::new()).await?);
    Ok(())
}

#[tokio::test]
async fn literal_true_means_locked() -> TestResult {
    init_tracing();

    let oracle = oracle("echo 'ScreenIsLocked = yes'", "printf '  true\\n'");
    assert!(oracle.is_locked(&CancellationToken::new()).await?);
    Ok(())
}

#[tokio::test]
async fn anything_but_literal_true_means_unlocked() -> TestResult {
    init_tracing();

    for output in ["false", "TRUE", "yes", "1", ""] {
        let oracle = oracle("echo ScreenIsLocked", &format!("printf '{output}'"));
        assert!(
            !oracle.is_locked(&CancellationToken::new()).await?,
            "{output:?} must not read as locked"
        );
    }
    Ok(())
}

#[tokio::test]
async fn extract_helper_reads_the_probe_dump_on_stdin() -> TestResult {
    init_tracing();

    let extract = "if grep -q 'ScreenIsLocked=on'; then echo true; else echo false; fi";

    let locked = oracle("echo 'ScreenIsLocked=on'", extract);
    assert!(locked.is_locked(&CancellationToken::new()).await?);

    let unlocked = oracle("echo 'ScreenIsLocked=off'", extract);
    assert!(!unlocked.is_locked(&CancellationToken::new()).await?);
    Ok(())
}

#[tokio::test]
async fn failing_probe_is_an_error() -> TestResult {
    init_tracing();

    let oracle = oracle("echo nope >&2; exit 2", "echo true");
    let err = oracle
        .is_locked(&CancellationToken::new())
        .await
        .expect_err("probe failure must surface");

    match err {
        WakedError::HelperFailed { program, detail } => {
            assert!(program.starts_with("/bin/sh"));
            assert!(detail.contains("nope"), "detail: {detail}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn failing_extract_is_an_error() -> TestResult {
    init_tracing();

    let oracle = oracle("echo ScreenIsLocked", "exit 1");
    assert!(oracle.is_locked(&CancellationToken::new()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn missing_helper_is_an_error() -> TestResult {
    init_tracing();

    let oracle = CommandLockOracle::new(
        HelperCommand::new("/nonexistent/probe", Vec::<String>::new()),
        sh("echo true"),
        MARKER,
    );
    let state = query_lock_state(&oracle, &CancellationToken::new()).await;
    assert!(matches!(state, Some(LockState::Unknown(_))), "{state:?}");
    Ok(())
}

#[tokio::test]
async fn cancellation_tears_down_a_slow_helper() -> TestResult {
    init_tracing();

    let oracle = oracle("exec sleep 30", "echo true");
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let res = with_timeout(oracle.is_locked(&cancel)).await;
    canceller.await?;

    assert!(matches!(res, Err(WakedError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));

    // Cancelled queries are not reported as an unknown lock state.
    assert_eq!(query_lock_state(&oracle, &cancel).await, None);
    Ok(())
}

#[tokio::test]
async fn query_lock_state_maps_answers() -> TestResult {
    init_tracing();

    let cancel = CancellationToken::new();
    let oracle = ScriptedOracle::new(OracleAnswer::Locked);
    assert_eq!(query_lock_state(&oracle, &cancel).await, Some(LockState::Locked));

    oracle.set(OracleAnswer::Unlocked);
    assert_eq!(query_lock_state(&oracle, &cancel).await, Some(LockState::Unlocked));

    oracle.set(OracleAnswer::Fail);
    assert!(matches!(
        query_lock_state(&oracle, &cancel).await,
        Some(LockState::Unknown(_))
    ));
    Ok(())
}
