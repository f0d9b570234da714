//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional, named by NETPANEL_CONFIG)
//!     → loader.rs (parse & deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to logging, database and the supervisor
//! ```
//!
//! # Design Decisions
//! - Process config (log level, db folder, deadlines) lives here; panel
//!   settings (ports, paths, certs) live in the database and are re-read on
//!   every reload
//! - All fields have defaults so the binary runs with no config file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{AppConfig, DatabaseConfig, LifecycleConfig, LogConfig, LogLevel, ObservabilityConfig};
