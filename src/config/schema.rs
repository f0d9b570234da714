//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the config file.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name of the settings store inside the database folder.
pub const DB_FILE_NAME: &str = "netpanel.json";

/// Root configuration for the panel process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Logging settings.
    pub log: LogConfig,

    /// Settings store location.
    pub database: DatabaseConfig,

    /// Server start/stop deadlines.
    pub lifecycle: LifecycleConfig,

    /// Metrics exporter settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Full path of the settings store.
    pub fn db_path(&self) -> PathBuf {
        self.database.folder.join(DB_FILE_NAME)
    }
}

/// Log verbosity accepted by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name, accepting `warning` as an alias of `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level emitted by the panel's own targets.
    pub level: LogLevel,

    /// Also emit debug output from HTTP middleware.
    pub debug: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            debug: false,
        }
    }
}

/// Settings store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Folder holding the settings store.
    pub folder: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("/etc/netpanel"),
        }
    }
}

/// Deadlines applied around server start and stop.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Maximum time a server may take to bind and start serving.
    pub start_timeout_secs: u64,

    /// Maximum time a server may take to stop, drain included.
    pub stop_timeout_secs: u64,

    /// Grace period for in-flight requests when a server stops.
    pub drain_secs: u64,
}

impl LifecycleConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 30,
            stop_timeout_secs: 30,
            drain_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
