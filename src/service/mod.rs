//! Typed access to the settings store.
//!
//! # Data Flow
//! ```text
//! CLI admin commands / server construction
//!     → setting.rs (typed getters/setters, defaults, validation)
//!     → user.rs (login account)
//!     → migration.rs (schema upgrades)
//!     → database::Database (string key/value document)
//! ```

pub mod migration;
pub mod setting;
pub mod user;

use std::path::PathBuf;

use thiserror::Error;

use crate::database::DatabaseError;

pub use migration::{migrate, MigrationReport};
pub use setting::SettingService;
pub use user::UserService;

/// Error type for typed setting and user operations.
#[derive(Debug, Error)]
pub enum SettingError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("setting {key} holds an invalid value {value:?}")]
    Malformed { key: &'static str, value: String },
    #[error("setting {key} holds an unroutable path {value:?}")]
    InvalidPath { key: &'static str, value: String },
    #[error("port {0} is out of range 1-65535")]
    InvalidPort(i64),
    #[error("file {} does not exist", .0.display())]
    MissingFile(PathBuf),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("no user found")]
    NoUser,
}
