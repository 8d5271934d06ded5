// src/wake/signal.rs

use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::WakeEvent;

/// Treat every SIGUSR1 as a resume notification.
///
/// Lets a system sleep hook (e.g. a `systemd-sleep` script running
/// `pkill -USR1 waked`) forward resumes explicitly.
pub fn spawn_signal_source(tx: mpsc::Sender<WakeEvent>) -> io::Result<JoinHandle<()>> {
    let mut usr1 = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        debug!("SIGUSR1 resume listener started");
        while usr1.recv().await.is_some() {
            if tx.send(WakeEvent::Signal).await.is_err() {
                warn!("wake event receiver gone; stopping SIGUSR1 listener");
                break;
            }
        }
    }))
}
