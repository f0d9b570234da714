//! Supervisor state machine driven by synthetic events.

use std::sync::Arc;

use netpanel::lifecycle::signals::signal_channel;
use netpanel::lifecycle::supervisor::{Supervisor, SupervisorError, SupervisorState};
use netpanel::lifecycle::{ServerRegistry, SignalEvent};
use netpanel::server::{ServerKind, ServerState};

mod common;
use common::{fast_lifecycle, Call, FakeFactory, Fault, Op};

const PANEL: ServerKind = ServerKind::Panel;
const SUB: ServerKind = ServerKind::Subscription;

fn supervisor(factory: &FakeFactory) -> (Supervisor<FakeFactory>, Arc<ServerRegistry>) {
    let registry = Arc::new(ServerRegistry::new());
    let sup = Supervisor::new(factory.clone(), registry.clone(), fast_lifecycle());
    (sup, registry)
}

#[tokio::test]
async fn test_reloads_then_terminate_stop_every_generation_once() {
    for reloads in 0..4u32 {
        let factory = FakeFactory::new();
        let (sup, _) = supervisor(&factory);
        let (tx, rx) = signal_channel();

        let run = tokio::spawn(sup.run(rx));
        for _ in 0..reloads {
            tx.send(SignalEvent::Reload).await.unwrap();
        }
        tx.send(SignalEvent::Terminate).await.unwrap();
        run.await.unwrap().unwrap();

        let recorder = &factory.recorder;
        for kind in [PANEL, SUB] {
            assert_eq!(recorder.count(kind, Op::Start), reloads as usize + 1);
            assert_eq!(recorder.count(kind, Op::Stop), reloads as usize + 1);
            for instance in 0..=reloads {
                let stops = recorder
                    .calls()
                    .iter()
                    .filter(|c| c.kind == kind && c.instance == instance && c.op == Op::Stop)
                    .count();
                assert_eq!(stops, 1, "{kind} instance {instance} stopped {stops} times");
            }
        }
    }
}

#[tokio::test]
async fn test_reload_stops_both_before_starting_panel_then_subscription() {
    let factory = FakeFactory::new();
    let (mut sup, _) = supervisor(&factory);

    sup.boot().await.unwrap();
    assert_eq!(sup.handle(SignalEvent::Reload).await.unwrap(), SupervisorState::Running);

    assert_eq!(
        factory.recorder.calls(),
        vec![
            Call::ok(PANEL, 0, Op::Start),
            Call::ok(SUB, 0, Op::Start),
            Call::ok(PANEL, 0, Op::Stop),
            Call::ok(SUB, 0, Op::Stop),
            Call::ok(PANEL, 1, Op::Start),
            Call::ok(SUB, 1, Op::Start),
        ]
    );
    assert_eq!(sup.generation(), 1);
}

#[tokio::test]
async fn test_panel_start_failure_at_boot_is_fatal_without_stops() {
    let factory = FakeFactory::new().with_fault(PANEL, 0, Fault::FailStart);
    let (sup, registry) = supervisor(&factory);
    let (tx, rx) = signal_channel();

    let err = sup.run(rx).await.unwrap_err();
    assert!(matches!(err, SupervisorError::Start { kind: ServerKind::Panel, .. }));
    assert_eq!(factory.recorder.count(PANEL, Op::Stop), 0);
    assert_eq!(factory.recorder.count(SUB, Op::Stop), 0);
    assert_eq!(factory.built(SUB), 0);
    assert!(registry.get(PANEL).is_none());
    drop(tx);
}

#[tokio::test]
async fn test_subscription_start_failure_at_boot_never_enters_running() {
    let factory = FakeFactory::new().with_fault(SUB, 0, Fault::FailStart);
    let (mut sup, _) = supervisor(&factory);

    let err = sup.boot().await.unwrap_err();
    assert!(matches!(err, SupervisorError::Start { kind: ServerKind::Subscription, .. }));
    assert_ne!(sup.state(), SupervisorState::Running);
    assert_eq!(factory.recorder.count(PANEL, Op::Stop), 0);
    assert_eq!(factory.recorder.count(SUB, Op::Stop), 0);
}

#[tokio::test]
async fn test_start_failure_during_reload_never_restarts_old_handle() {
    let factory = FakeFactory::new().with_fault(PANEL, 1, Fault::FailStart);
    let (mut sup, registry) = supervisor(&factory);

    sup.boot().await.unwrap();
    let err = sup.handle(SignalEvent::Reload).await.unwrap_err();
    assert!(matches!(err, SupervisorError::Start { kind: ServerKind::Panel, .. }));

    let calls = factory.recorder.calls();
    let old_panel_starts = calls
        .iter()
        .filter(|c| c.kind == PANEL && c.instance == 0 && c.op == Op::Start)
        .count();
    assert_eq!(old_panel_starts, 1);
    assert_eq!(factory.recorder.count(SUB, Op::Start), 1);
    assert_eq!(factory.built(SUB), 1);

    // The registry still points at the stopped generation-0 panel.
    let stale = registry.get(PANEL).unwrap();
    assert_eq!(stale.state(), ServerState::Stopped);
    assert_eq!(registry.generation(PANEL), Some(0));
}

#[tokio::test]
async fn test_subscription_start_failure_during_reload_is_fatal() {
    let factory = FakeFactory::new().with_fault(SUB, 1, Fault::FailStart);
    let (mut sup, registry) = supervisor(&factory);

    sup.boot().await.unwrap();
    let err = sup.handle(SignalEvent::Reload).await.unwrap_err();
    assert!(matches!(err, SupervisorError::Start { kind: ServerKind::Subscription, .. }));
    assert_eq!(sup.state(), SupervisorState::Reloading);

    let calls = factory.recorder.calls();
    assert_eq!(
        calls,
        vec![
            Call::ok(PANEL, 0, Op::Start),
            Call::ok(SUB, 0, Op::Start),
            Call::ok(PANEL, 0, Op::Stop),
            Call::ok(SUB, 0, Op::Stop),
            Call::ok(PANEL, 1, Op::Start),
            Call {
                kind: SUB,
                instance: 1,
                op: Op::Start,
                ok: false,
            },
        ]
    );
    let old_sub_starts = calls
        .iter()
        .filter(|c| c.kind == SUB && c.instance == 0 && c.op == Op::Start)
        .count();
    assert_eq!(old_sub_starts, 1);

    // The new panel is published; the subscription slot still holds generation 0.
    assert_eq!(registry.generation(PANEL), Some(1));
    assert_eq!(registry.generation(SUB), Some(0));
    assert_eq!(registry.get(SUB).unwrap().state(), ServerState::Stopped);
}

#[tokio::test]
async fn test_stop_errors_do_not_abort_reload() {
    let factory = FakeFactory::new()
        .with_fault(PANEL, 0, Fault::FailStop)
        .with_fault(SUB, 0, Fault::HangStop);
    let (mut sup, registry) = supervisor(&factory);

    sup.boot().await.unwrap();
    assert_eq!(sup.handle(SignalEvent::Reload).await.unwrap(), SupervisorState::Running);

    assert_eq!(factory.recorder.count(PANEL, Op::Start), 2);
    assert_eq!(factory.recorder.count(SUB, Op::Start), 2);
    assert_eq!(registry.generation(PANEL), Some(1));
    assert_eq!(registry.generation(SUB), Some(1));
}

#[tokio::test]
async fn test_start_timeout_is_fatal() {
    let factory = FakeFactory::new().with_fault(PANEL, 0, Fault::HangStart);
    let (mut sup, _) = supervisor(&factory);

    let err = sup.boot().await.unwrap_err();
    assert!(matches!(err, SupervisorError::StartTimeout { kind: ServerKind::Panel, secs: 1 }));
    assert_eq!(factory.built(SUB), 0);
}

#[tokio::test]
async fn test_registry_follows_reloads() {
    let factory = FakeFactory::new();
    let (mut sup, registry) = supervisor(&factory);

    sup.boot().await.unwrap();
    let first = registry.get(PANEL).unwrap();
    assert_eq!(first.state(), ServerState::Running);

    sup.handle(SignalEvent::Reload).await.unwrap();
    let second = registry.get(PANEL).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.state(), ServerState::Stopped);
    assert_eq!(second.state(), ServerState::Running);
    assert_eq!(registry.generation(SUB), Some(1));
}

#[tokio::test]
async fn test_unrecognized_event_terminates() {
    let factory = FakeFactory::new();
    let (mut sup, _) = supervisor(&factory);

    sup.boot().await.unwrap();
    assert_eq!(sup.handle(SignalEvent::Other).await.unwrap(), SupervisorState::Terminated);
    assert_eq!(factory.recorder.count(PANEL, Op::Stop), 1);
    assert_eq!(factory.recorder.count(SUB, Op::Stop), 1);

    // Terminated is absorbing.
    assert_eq!(sup.handle(SignalEvent::Reload).await.unwrap(), SupervisorState::Terminated);
    assert_eq!(factory.recorder.count(PANEL, Op::Start), 1);
    assert_eq!(factory.recorder.count(PANEL, Op::Stop), 1);
}

#[tokio::test]
async fn test_closed_queue_terminates() {
    let factory = FakeFactory::new();
    let (sup, _) = supervisor(&factory);
    let (tx, rx) = signal_channel();
    drop(tx);

    sup.run(rx).await.unwrap();
    assert_eq!(factory.recorder.count(PANEL, Op::Stop), 1);
    assert_eq!(factory.recorder.count(SUB, Op::Stop), 1);
}

#[tokio::test]
async fn test_events_before_boot_are_rejected() {
    let factory = FakeFactory::new();
    let (mut sup, _) = supervisor(&factory);

    assert!(matches!(
        sup.handle(SignalEvent::Reload).await,
        Err(SupervisorError::InvalidTransition { state: SupervisorState::Init, .. })
    ));
    assert!(factory.recorder.calls().is_empty());
}
