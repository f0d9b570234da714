//! Server components owned by the supervisor.
//!
//! # Data Flow
//! ```text
//! ServerFactory::build(kind)
//!     → PanelServer / SubServer (Stopped, holds the settings store)
//!     → start(): read settings → bind → TLS → spawn serve task (Running)
//!     → stop():  graceful shutdown → await serve task (Stopped)
//! ```
//!
//! # Design Decisions
//! - A handle is single-use: reload builds a new one instead of restarting
//! - Start returns only once the listener is bound
//! - Stop returns only once the listener is released

pub mod http;
pub mod panel;
pub mod subscription;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::LifecycleConfig;
use crate::database::Database;
use crate::lifecycle::registry::ServerRegistry;
use crate::net::{ListenerError, TlsError};
use crate::service::SettingError;

pub use panel::PanelServer;
pub use subscription::SubServer;

/// The two services the supervisor manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Panel,
    Subscription,
}

impl ServerKind {
    pub const ALL: [ServerKind; 2] = [ServerKind::Panel, ServerKind::Subscription];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerKind::Panel => "panel",
            ServerKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    Stopped,
    Running,
}

/// Error type for server start/stop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0} server is already running")]
    AlreadyRunning(ServerKind),
    #[error("{0} server is not running")]
    NotRunning(ServerKind),
    #[error("failed to read {kind} server settings: {source}")]
    Settings {
        kind: ServerKind,
        #[source]
        source: SettingError,
    },
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("{kind} serve task failed: {message}")]
    Task { kind: ServerKind, message: String },
}

/// A startable/stoppable network service.
#[async_trait]
pub trait ServerHandle: Send + Sync {
    fn kind(&self) -> ServerKind;

    fn state(&self) -> ServerState;

    /// Address the listener is bound to while running.
    fn local_addr(&self) -> Option<SocketAddr>;

    /// Stopped → Running. On error the handle stays Stopped.
    async fn start(&self) -> Result<(), ServerError>;

    /// Running → Stopped, waiting for the listener to be released.
    async fn stop(&self) -> Result<(), ServerError>;
}

/// Builds fresh handles for the supervisor.
pub trait ServerFactory: Send + Sync {
    fn build(&self, kind: ServerKind) -> Arc<dyn ServerHandle>;
}

/// Factory for the real panel and subscription servers.
pub struct DefaultServerFactory {
    db: Database,
    registry: Arc<ServerRegistry>,
    lifecycle: LifecycleConfig,
}

impl DefaultServerFactory {
    pub fn new(db: Database, registry: Arc<ServerRegistry>, lifecycle: LifecycleConfig) -> Self {
        Self {
            db,
            registry,
            lifecycle,
        }
    }
}

impl ServerFactory for DefaultServerFactory {
    fn build(&self, kind: ServerKind) -> Arc<dyn ServerHandle> {
        match kind {
            ServerKind::Panel => Arc::new(PanelServer::new(
                self.db.clone(),
                self.registry.clone(),
                self.lifecycle.drain(),
            )),
            ServerKind::Subscription => {
                Arc::new(SubServer::new(self.db.clone(), self.lifecycle.drain()))
            }
        }
    }
}
