//! Network panel process: supervisor, settings store and admin CLI.

pub mod cli;
pub mod config;
pub mod database;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;
pub mod service;

pub use config::AppConfig;
pub use database::Database;
pub use lifecycle::{ServerRegistry, SignalEvent, Supervisor, SupervisorState};
pub use server::{ServerHandle, ServerKind};
