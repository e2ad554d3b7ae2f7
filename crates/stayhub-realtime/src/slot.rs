//! Set-once holder for the process-wide event router.

use std::sync::{Arc, LazyLock, OnceLock};

use stayhub_core::error::AppError;

use crate::router::EventRouter;

static GLOBAL: LazyLock<RouterSlot> = LazyLock::new(RouterSlot::new);

/// Cloneable handle to a cell that receives the router once.
///
/// Collaborators that start before the socket server (such as the
/// notification dispatcher) hold a slot and look the router up on use;
/// an empty slot means the router is not initialised yet.
#[derive(Debug, Clone, Default)]
pub struct RouterSlot {
    cell: Arc<OnceLock<Arc<EventRouter>>>,
}

impl RouterSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot shared by the whole process.
    pub fn global() -> &'static RouterSlot {
        &GLOBAL
    }

    /// Install the router. Fails if one is already installed.
    pub fn install(&self, router: Arc<EventRouter>) -> Result<(), AppError> {
        self.cell
            .set(router)
            .map_err(|_| AppError::conflict("Event router already initialised"))
    }

    /// The installed router, if any.
    pub fn get(&self) -> Option<Arc<EventRouter>> {
        self.cell.get().cloned()
    }

    /// Whether a router has been installed.
    pub fn is_initialised(&self) -> bool {
        self.cell.get().is_some()
    }
}
