//! Process-wide view of the active server handles.
//!
//! Written only by the supervisor; read by anything holding the
//! `Arc<ServerRegistry>`. During a reload a reader may still see the old,
//! already stopped handle until the replacement is published.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::server::{ServerHandle, ServerKind};

struct Published {
    handle: Arc<dyn ServerHandle>,
    generation: u64,
}

/// One last-write-wins slot per server kind.
#[derive(Default)]
pub struct ServerRegistry {
    panel: ArcSwapOption<Published>,
    subscription: ArcSwapOption<Published>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot for the handle's kind.
    pub fn publish(&self, handle: Arc<dyn ServerHandle>, generation: u64) {
        let kind = handle.kind();
        self.slot(kind)
            .store(Some(Arc::new(Published { handle, generation })));
        tracing::debug!(server = %kind, generation, "Handle published");
    }

    /// The currently published handle, if any.
    pub fn get(&self, kind: ServerKind) -> Option<Arc<dyn ServerHandle>> {
        self.slot(kind).load_full().map(|p| p.handle.clone())
    }

    /// Supervisor generation of the published handle (0 = initial boot).
    pub fn generation(&self, kind: ServerKind) -> Option<u64> {
        self.slot(kind).load().as_ref().map(|p| p.generation)
    }

    fn slot(&self, kind: ServerKind) -> &ArcSwapOption<Published> {
        match kind {
            ServerKind::Panel => &self.panel,
            ServerKind::Subscription => &self.subscription,
        }
    }
}
