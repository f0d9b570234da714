//! Real OS signals reach the supervisor queue.

use std::time::Duration;

use netpanel::lifecycle::signals::{signal_channel, spawn_signal_listener};
use netpanel::lifecycle::SignalEvent;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

#[tokio::test]
async fn test_hangup_and_terminate_are_translated() {
    let (tx, mut rx) = signal_channel();
    let listener = spawn_signal_listener(tx).unwrap();

    kill(Pid::this(), Signal::SIGHUP).unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(event, Some(SignalEvent::Reload));

    kill(Pid::this(), Signal::SIGTERM).unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(event, Some(SignalEvent::Terminate));

    listener.abort();
}
