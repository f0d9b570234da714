//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open database → Register signals → Supervisor boot
//!
//! Signals (signals.rs):
//!     SIGHUP  → SignalEvent::Reload
//!     SIGTERM → SignalEvent::Terminate
//!
//! Supervisor (supervisor.rs):
//!     Reload    → stop both → start fresh panel → start fresh subscription
//!     Terminate → stop both → exit
//!
//! Registry (registry.rs):
//!     Supervisor publishes each new handle; other components read it
//! ```

pub mod registry;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use registry::ServerRegistry;
pub use signals::SignalEvent;
pub use supervisor::{Supervisor, SupervisorError, SupervisorState};
