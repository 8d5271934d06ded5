// src/wake/mod.rs

//! Resume-event sources.
//!
//! The dispatcher does not care how a resume is detected: every source
//! sends a [`WakeEvent`] into one mpsc channel and [`pump_wake_events`]
//! hands each of them to [`WakeDispatcher::on_wake_event`].
//!
//! - [`clock`] infers a resume from the wall clock jumping ahead of the
//!   monotonic clock (which does not advance while the machine sleeps).
//! - [`signal`] lets an external sleep hook forward a resume as SIGUSR1.

pub mod clock;
#[cfg(unix)]
pub mod signal;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dispatch::WakeDispatcher;

pub use clock::{detect_sleep_gap, spawn_clock_jump_source, DEFAULT_SLEEP_THRESHOLD};
#[cfg(unix)]
pub use signal::spawn_signal_source;

/// Where a resume notification came from. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeEvent {
    /// Wall clock advanced `slept` more than the monotonic clock.
    ClockJump { slept: Duration },
    /// Resume forwarded by signal.
    Signal,
    /// Synthetic event requested at startup.
    Startup,
}

/// Feed every received event to `dispatcher`, in arrival order.
///
/// Returns once all senders are gone.
pub async fn pump_wake_events(mut rx: mpsc::Receiver<WakeEvent>, dispatcher: Arc<WakeDispatcher>) {
    while let Some(event) = rx.recv().await {
        info!(?event, "resume event");
        if let Some(report) = dispatcher.on_wake_event().await {
            debug!(
                generation = report.generation,
                executables = report.started.len(),
                "resume event dispatched"
            );
        }
    }
    debug!("wake event channel closed");
}
