//! Network layer shared by both server components.
//!
//! # Data Flow
//! ```text
//! settings (listen, port, cert paths)
//!     → listener.rs (bind before Start returns)
//!     → tls.rs (optional rustls config from PEM files)
//!     → axum-server serve task
//! ```

pub mod listener;
pub mod tls;

pub use listener::{BoundListener, ListenerError};
pub use tls::{load_tls_config, TlsError};
