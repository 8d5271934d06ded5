// src/wake/clock.rs

use std::time::{Duration, Instant, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::WakeEvent;

/// Smallest wall-vs-monotonic gap treated as a sleep. Large enough that NTP
/// slews and scheduler hiccups do not count.
pub const DEFAULT_SLEEP_THRESHOLD: Duration = Duration::from_secs(15);

/// Decide whether the host slept between two clock samples.
///
/// `wall` and `monotonic` are the elapsed times measured by each clock over
/// the same interval. Returns the estimated sleep duration when the wall
/// clock ran ahead by more than `threshold`.
pub fn detect_sleep_gap(wall: Duration, monotonic: Duration, threshold: Duration) -> Option<Duration> {
    let gap = wall.checked_sub(monotonic)?;
    (gap > threshold).then_some(gap)
}

/// Poll both clocks every `poll` and send a [`WakeEvent::ClockJump`] when a
/// sleep is detected.
///
/// The task ends when the receiver is dropped.
pub fn spawn_clock_jump_source(
    poll: Duration,
    threshold: Duration,
    tx: mpsc::Sender<WakeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(poll_ms = poll.as_millis() as u64, "clock jump detector started");

        loop {
            let wall_start = SystemTime::now();
            let mono_start = Instant::now();

            tokio::time::sleep(poll).await;

            // A wall clock stepped backwards reads as "no sleep".
            let wall = SystemTime::now()
                .duration_since(wall_start)
                .unwrap_or_default();
            let monotonic = mono_start.elapsed();

            if let Some(slept) = detect_sleep_gap(wall, monotonic, threshold) {
                if tx.send(WakeEvent::ClockJump { slept }).await.is_err() {
                    warn!("wake event receiver gone; stopping clock jump detector");
                    break;
                }
            }
        }
    })
}
