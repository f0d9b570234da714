//! Configuration validation.
//!
//! Returns every problem found, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown log level: {0}")]
    UnknownLogLevel(String),
    #[error("database folder must not be empty")]
    EmptyDatabaseFolder,
    #[error("lifecycle.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.folder.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyDatabaseFolder);
    }
    if config.lifecycle.start_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("start_timeout_secs"));
    }
    if config.lifecycle.stop_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("stop_timeout_secs"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
