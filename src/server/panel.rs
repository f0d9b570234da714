//! Panel (management) server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::database::Database;
use crate::lifecycle::registry::ServerRegistry;
use crate::server::http::{Binding, HttpRuntime};
use crate::server::{ServerError, ServerHandle, ServerKind, ServerState};
use crate::service::{SettingError, SettingService};

#[derive(Clone)]
struct PanelState {
    started: Instant,
    registry: Arc<ServerRegistry>,
}

#[derive(Serialize)]
pub struct PanelStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub subscription: Option<PeerStatus>,
}

#[derive(Serialize)]
pub struct PeerStatus {
    pub state: ServerState,
    pub address: Option<SocketAddr>,
}

pub struct PanelServer {
    settings: SettingService,
    registry: Arc<ServerRegistry>,
    runtime: HttpRuntime,
}

impl PanelServer {
    pub fn new(db: Database, registry: Arc<ServerRegistry>, drain: Duration) -> Self {
        Self {
            settings: SettingService::new(db),
            registry,
            runtime: HttpRuntime::new(ServerKind::Panel, drain),
        }
    }

    fn read_settings(&self) -> Result<(Binding, String), SettingError> {
        let binding = Binding {
            listen: self.settings.get_listen()?,
            port: self.settings.get_port()?,
            cert_file: self.settings.get_cert_file()?,
            key_file: self.settings.get_key_file()?,
        };
        Ok((binding, self.settings.get_base_path()?))
    }
}

#[async_trait]
impl ServerHandle for PanelServer {
    fn kind(&self) -> ServerKind {
        ServerKind::Panel
    }

    fn state(&self) -> ServerState {
        self.runtime.state()
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.runtime.local_addr()
    }

    async fn start(&self) -> Result<(), ServerError> {
        let (binding, base_path) = self.read_settings().map_err(|source| ServerError::Settings {
            kind: ServerKind::Panel,
            source,
        })?;
        let state = PanelState {
            started: Instant::now(),
            registry: self.registry.clone(),
        };
        tracing::debug!(base_path = %base_path, port = binding.port, "Starting panel server");
        self.runtime.start(&binding, panel_router(&base_path, state)).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        self.runtime.stop().await
    }
}

fn panel_router(base_path: &str, state: PanelState) -> Router {
    Router::new()
        .route(base_path, get(index))
        .route(&format!("{base_path}api/status"), get(status))
        .with_state(state)
}

async fn index() -> String {
    format!("{} {}\n", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

async fn status(State(state): State<PanelState>) -> Json<PanelStatus> {
    let subscription = state
        .registry
        .get(ServerKind::Subscription)
        .map(|handle| PeerStatus {
            state: handle.state(),
            address: handle.local_addr(),
        });

    Json(PanelStatus {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
        subscription,
    })
}
