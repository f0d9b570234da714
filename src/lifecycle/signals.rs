//! OS signal handling.
//!
//! # Responsibilities
//! - Register exactly SIGHUP (reload) and SIGTERM (terminate)
//! - Translate signals to `SignalEvent`s on a bounded queue
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Every other signal keeps its default OS disposition
//! - The queue holds one pending event while the supervisor is busy; the
//!   listener waits for room rather than dropping

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the signal queue.
pub const SIGNAL_QUEUE_CAPACITY: usize = 1;

/// An event consumed by the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// Rebuild both servers from fresh settings.
    Reload,
    /// Stop both servers and exit.
    Terminate,
    /// Anything unrecognized; handled like `Terminate`.
    Other,
}

/// Create the supervisor's event queue.
pub fn signal_channel() -> (mpsc::Sender<SignalEvent>, mpsc::Receiver<SignalEvent>) {
    mpsc::channel(SIGNAL_QUEUE_CAPACITY)
}

/// Register the reload and terminate signals and forward them to `tx`.
///
/// Registration happens before this returns, so a registration failure is
/// reported to the caller instead of being lost in the task.
pub fn spawn_signal_listener(tx: mpsc::Sender<SignalEvent>) -> std::io::Result<JoinHandle<()>> {
    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(()) = hangup.recv() => SignalEvent::Reload,
                Some(()) = terminate.recv() => SignalEvent::Terminate,
                else => break,
            };

            tracing::info!(?event, "Signal received");
            if tx.send(event).await.is_err() {
                tracing::debug!("Supervisor gone, signal listener exiting");
                break;
            }
        }
    }))
}
