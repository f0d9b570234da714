//! Supervisor loop owning the panel and subscription servers.
//!
//! # State Transitions
//! ```text
//! Init ──boot ok──▶ Running ──Reload──▶ Reloading ──restart ok──▶ Running
//!   │                  │                    │
//!   │ start failed     │ Terminate/Other    │ start failed
//!   ▼                  ▼                    ▼
//! (fatal error)    Terminated           (fatal error)
//! ```
//!
//! # Design Decisions
//! - Reload discards both handles and builds fresh ones, so settings are
//!   always re-read; there is a window where neither instance serves
//! - Old handles are fully stopped before any replacement starts
//! - Stop failures are warnings; Start failures end the supervisor with no
//!   rollback to the previous instance
//! - Every Start/Stop runs under a deadline

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::LifecycleConfig;
use crate::lifecycle::registry::ServerRegistry;
use crate::lifecycle::signals::SignalEvent;
use crate::observability::metrics;
use crate::server::{ServerError, ServerFactory, ServerHandle, ServerKind};

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Init,
    Running,
    Reloading,
    Terminated,
}

/// Fatal supervisor failures; the process is expected to exit on any of them.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to start {kind} server: {source}")]
    Start {
        kind: ServerKind,
        #[source]
        source: ServerError,
    },
    #[error("{kind} server did not start within {secs}s")]
    StartTimeout { kind: ServerKind, secs: u64 },
    #[error("supervisor cannot handle {event:?} in state {state:?}")]
    InvalidTransition {
        state: SupervisorState,
        event: SignalEvent,
    },
}

/// Next state for an event delivered while the supervisor waits for signals.
pub fn transition(state: SupervisorState, event: SignalEvent) -> SupervisorState {
    match (state, event) {
        (SupervisorState::Terminated, _) => SupervisorState::Terminated,
        (SupervisorState::Running, SignalEvent::Reload) => SupervisorState::Reloading,
        (SupervisorState::Running, SignalEvent::Terminate | SignalEvent::Other) => {
            SupervisorState::Terminated
        }
        // Init and Reloading never wait on the queue.
        (other, _) => other,
    }
}

pub struct Supervisor<F> {
    factory: F,
    registry: Arc<ServerRegistry>,
    lifecycle: LifecycleConfig,
    state: SupervisorState,
    generation: u64,
    panel: Option<Arc<dyn ServerHandle>>,
    subscription: Option<Arc<dyn ServerHandle>>,
}

impl<F: ServerFactory> Supervisor<F> {
    pub fn new(factory: F, registry: Arc<ServerRegistry>, lifecycle: LifecycleConfig) -> Self {
        Self {
            factory,
            registry,
            lifecycle,
            state: SupervisorState::Init,
            generation: 0,
            panel: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Number of completed reloads.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Boot, then process events until terminated or a Start fails.
    ///
    /// A closed queue is treated as Terminate.
    pub async fn run(mut self, mut events: mpsc::Receiver<SignalEvent>) -> Result<(), SupervisorError> {
        self.boot().await?;

        while self.state != SupervisorState::Terminated {
            let event = events.recv().await.unwrap_or_else(|| {
                tracing::warn!("Signal queue closed, shutting down");
                SignalEvent::Terminate
            });
            self.handle(event).await?;
        }

        tracing::info!(reloads = self.generation, "Supervisor terminated");
        Ok(())
    }

    /// Init → Running: start both servers and publish them.
    pub async fn boot(&mut self) -> Result<(), SupervisorError> {
        if self.state != SupervisorState::Init {
            return Err(SupervisorError::InvalidTransition {
                state: self.state,
                event: SignalEvent::Other,
            });
        }

        let panel = self.start_new(ServerKind::Panel).await?;
        let subscription = self.start_new(ServerKind::Subscription).await?;
        self.registry.publish(panel.clone(), self.generation);
        self.registry.publish(subscription.clone(), self.generation);
        self.panel = Some(panel);
        self.subscription = Some(subscription);

        self.state = SupervisorState::Running;
        tracing::info!("Supervisor running");
        Ok(())
    }

    /// Apply one event and return the resulting state.
    pub async fn handle(&mut self, event: SignalEvent) -> Result<SupervisorState, SupervisorError> {
        if self.state == SupervisorState::Init {
            return Err(SupervisorError::InvalidTransition {
                state: self.state,
                event,
            });
        }

        match transition(self.state, event) {
            SupervisorState::Reloading => {
                self.state = SupervisorState::Reloading;
                self.reload().await?;
                self.state = SupervisorState::Running;
            }
            SupervisorState::Terminated if self.state != SupervisorState::Terminated => {
                tracing::info!(?event, "Shutting down servers");
                self.stop_current().await;
                self.state = SupervisorState::Terminated;
            }
            _ => {}
        }
        Ok(self.state)
    }

    async fn reload(&mut self) -> Result<(), SupervisorError> {
        tracing::info!(generation = self.generation + 1, "Reloading servers");
        metrics::record_reload();
        self.stop_current().await;
        self.generation += 1;

        let panel = self.start_new(ServerKind::Panel).await?;
        self.registry.publish(panel.clone(), self.generation);
        self.panel = Some(panel);

        let subscription = self.start_new(ServerKind::Subscription).await?;
        self.registry.publish(subscription.clone(), self.generation);
        self.subscription = Some(subscription);

        tracing::info!(generation = self.generation, "Reload complete");
        Ok(())
    }

    /// Stop the owned handles, panel first. Errors are logged only.
    async fn stop_current(&mut self) {
        for handle in [self.panel.take(), self.subscription.take()].into_iter().flatten() {
            self.stop(handle.as_ref()).await;
        }
    }

    async fn stop(&self, handle: &dyn ServerHandle) {
        let kind = handle.kind();
        match timeout(self.lifecycle.stop_timeout(), handle.stop()).await {
            Ok(Ok(())) => {
                metrics::record_server_running(kind, false);
            }
            Ok(Err(e)) => {
                metrics::record_stop_error(kind);
                tracing::warn!(server = %kind, error = %e, "Stop server error");
            }
            Err(_) => {
                metrics::record_stop_error(kind);
                tracing::warn!(
                    server = %kind,
                    timeout_secs = self.lifecycle.stop_timeout_secs,
                    "Stop server timed out"
                );
            }
        }
    }

    async fn start_new(&self, kind: ServerKind) -> Result<Arc<dyn ServerHandle>, SupervisorError> {
        let handle = self.factory.build(kind);
        match timeout(self.lifecycle.start_timeout(), handle.start()).await {
            Ok(Ok(())) => {
                metrics::record_server_start(kind);
                metrics::record_server_running(kind, true);
                Ok(handle)
            }
            Ok(Err(source)) => {
                tracing::error!(server = %kind, error = %source, "Start server failed");
                Err(SupervisorError::Start { kind, source })
            }
            Err(_) => {
                tracing::error!(
                    server = %kind,
                    timeout_secs = self.lifecycle.start_timeout_secs,
                    "Start server timed out"
                );
                Err(SupervisorError::StartTimeout {
                    kind,
                    secs: self.lifecycle.start_timeout_secs,
                })
            }
        }
    }
}
