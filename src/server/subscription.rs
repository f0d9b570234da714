//! Subscription delivery server.
//!
//! Content generation for subscriptions lives outside this crate; the server
//! here owns the listener, routing and lifecycle.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::database::Database;
use crate::server::http::{Binding, HttpRuntime};
use crate::server::{ServerError, ServerHandle, ServerKind, ServerState};
use crate::service::{SettingError, SettingService};

/// Hours between client refreshes advertised to subscribers.
const UPDATE_INTERVAL_HOURS: u32 = 12;

pub struct SubServer {
    settings: SettingService,
    runtime: HttpRuntime,
    /// Started while `subEnable` was off: Running without a listener.
    idle: AtomicBool,
}

impl SubServer {
    pub fn new(db: Database, drain: Duration) -> Self {
        Self {
            settings: SettingService::new(db),
            runtime: HttpRuntime::new(ServerKind::Subscription, drain),
            idle: AtomicBool::new(false),
        }
    }

    fn read_settings(&self) -> Result<Option<(Binding, String)>, SettingError> {
        if !self.settings.get_sub_enable()? {
            return Ok(None);
        }
        let binding = Binding {
            listen: self.settings.get_sub_listen()?,
            port: self.settings.get_sub_port()?,
            cert_file: self.settings.get_sub_cert_file()?,
            key_file: self.settings.get_sub_key_file()?,
        };
        Ok(Some((binding, self.settings.get_sub_path()?)))
    }
}

#[async_trait]
impl ServerHandle for SubServer {
    fn kind(&self) -> ServerKind {
        ServerKind::Subscription
    }

    fn state(&self) -> ServerState {
        if self.idle.load(Ordering::Acquire) {
            ServerState::Running
        } else {
            self.runtime.state()
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.runtime.local_addr()
    }

    async fn start(&self) -> Result<(), ServerError> {
        if self.state() == ServerState::Running {
            return Err(ServerError::AlreadyRunning(ServerKind::Subscription));
        }
        let settings = self.read_settings().map_err(|source| ServerError::Settings {
            kind: ServerKind::Subscription,
            source,
        })?;

        match settings {
            None => {
                self.idle.store(true, Ordering::Release);
                tracing::info!("Subscription server disabled, not listening");
                Ok(())
            }
            Some((binding, sub_path)) => {
                self.runtime.start(&binding, sub_router(&sub_path)).await?;
                Ok(())
            }
        }
    }

    async fn stop(&self) -> Result<(), ServerError> {
        if self.idle.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.runtime.stop().await
    }
}

fn sub_router(sub_path: &str) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(&format!("{sub_path}{{id}}"), get(subscription))
}

async fn subscription(Path(id): Path<String>) -> impl IntoResponse {
    if id.trim().is_empty() {
        return (StatusCode::NOT_FOUND, "unknown subscription").into_response();
    }
    tracing::debug!(sub_id = %id, "Subscription requested");
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::HeaderName::from_static("profile-update-interval"),
                UPDATE_INTERVAL_HOURS.to_string(),
            ),
        ],
        format!("# subscription {id}\n"),
    )
        .into_response()
}
