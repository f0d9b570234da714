//! Startup orchestration for the `run` command.
//!
//! # Responsibilities
//! - Open the settings store (fatal on failure)
//! - Start the optional metrics exporter
//! - Register signals, build the registry and factory, hand over to the
//!   supervisor
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Signals are registered before the first server starts, so an early
//!   SIGHUP is queued instead of killing the process

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::database::{Database, DatabaseError};
use crate::lifecycle::registry::ServerRegistry;
use crate::lifecycle::signals::{signal_channel, spawn_signal_listener};
use crate::lifecycle::supervisor::{Supervisor, SupervisorError};
use crate::observability::metrics;
use crate::server::DefaultServerFactory;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Database(#[from] DatabaseError),
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error("failed to start metrics exporter on {addr}: {message}")]
    Metrics { addr: String, message: String },
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// Run the panel until SIGTERM, or until a server fails to start.
pub async fn run_server(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        "Starting"
    );

    let db_path = config.db_path();
    let db = Database::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Database ready");

    if config.observability.metrics_enabled {
        let addr = &config.observability.metrics_address;
        let parsed: SocketAddr = addr.parse().map_err(|e: std::net::AddrParseError| {
            StartupError::Metrics {
                addr: addr.clone(),
                message: e.to_string(),
            }
        })?;
        metrics::init_metrics(parsed).map_err(|message| StartupError::Metrics {
            addr: addr.clone(),
            message,
        })?;
    }

    let registry = Arc::new(ServerRegistry::new());
    let (tx, rx) = signal_channel();
    let _signals = spawn_signal_listener(tx).map_err(StartupError::Signals)?;

    let factory = DefaultServerFactory::new(db, registry.clone(), config.lifecycle.clone());
    Supervisor::new(factory, registry, config.lifecycle)
        .run(rx)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
