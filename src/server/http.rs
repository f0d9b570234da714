//! Serving machinery shared by the panel and subscription servers.
//!
//! # Responsibilities
//! - Bind the listener and load TLS material before Start returns
//! - Spawn the axum-server task with a graceful-shutdown handle
//! - Wire common middleware (request ID, tracing, timeout)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::net::{load_tls_config, BoundListener};
use crate::server::{ServerError, ServerKind, ServerState};

/// Per-request timeout applied to every route.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how a server listens, read fresh from settings on each Start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub listen: String,
    pub port: u16,
    pub cert_file: String,
    pub key_file: String,
}

impl Binding {
    /// Both certificate paths, when TLS is configured.
    pub fn tls_paths(&self) -> Option<(&Path, &Path)> {
        if self.cert_file.is_empty() || self.key_file.is_empty() {
            return None;
        }
        Some((Path::new(&self.cert_file), Path::new(&self.key_file)))
    }
}

struct Running {
    handle: Handle,
    task: JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
}

/// Start/stop state of one axum-server instance.
pub struct HttpRuntime {
    kind: ServerKind,
    drain: Duration,
    /// Serializes start and stop.
    op: tokio::sync::Mutex<()>,
    running: Mutex<Option<Running>>,
}

impl HttpRuntime {
    pub fn new(kind: ServerKind, drain: Duration) -> Self {
        Self {
            kind,
            drain,
            op: tokio::sync::Mutex::new(()),
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ServerState {
        if self.slot().is_some() {
            ServerState::Running
        } else {
            ServerState::Stopped
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.slot().as_ref().map(|r| r.local_addr)
    }

    /// Bind and start serving `router`.
    pub async fn start(&self, binding: &Binding, router: Router) -> Result<SocketAddr, ServerError> {
        let _op = self.op.lock().await;
        if self.slot().is_some() {
            return Err(ServerError::AlreadyRunning(self.kind));
        }

        let tls = match binding.tls_paths() {
            Some((cert, key)) => Some(load_tls_config(cert, key).await?),
            None => None,
        };

        let listener = BoundListener::bind(&binding.listen, binding.port).await?;
        let local_addr = listener.local_addr();
        let handle = Handle::new();
        let app = with_common_layers(router).into_make_service();

        let task = match tls.clone() {
            Some(config) => {
                let server =
                    axum_server::from_tcp_rustls(listener.into_std(), config).handle(handle.clone());
                tokio::spawn(async move { server.serve(app).await })
            }
            None => {
                let server = axum_server::from_tcp(listener.into_std()).handle(handle.clone());
                tokio::spawn(async move { server.serve(app).await })
            }
        };

        *self.slot() = Some(Running {
            handle,
            task,
            local_addr,
        });

        tracing::info!(
            server = %self.kind,
            address = %local_addr,
            tls = tls.is_some(),
            "Server started"
        );
        Ok(local_addr)
    }

    /// Gracefully shut down and wait for the listener to be released.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let _op = self.op.lock().await;
        let running = self
            .slot()
            .take()
            .ok_or(ServerError::NotRunning(self.kind))?;

        running.handle.graceful_shutdown(Some(self.drain));
        let result = match running.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ServerError::Task {
                kind: self.kind,
                message: e.to_string(),
            }),
            Err(e) => Err(ServerError::Task {
                kind: self.kind,
                message: e.to_string(),
            }),
        };

        tracing::info!(
            server = %self.kind,
            address = %running.local_addr,
            ok = result.is_ok(),
            "Server stopped"
        );
        result
    }

    fn slot(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wrap a router with the middleware every server carries.
#[allow(deprecated)]
fn with_common_layers(router: Router) -> Router {
    router
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
