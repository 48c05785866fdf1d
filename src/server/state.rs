//! Shared application state injected into every handler.

use std::sync::Arc;

use polyglot_forge_core::batch::BatchSettings;
use polyglot_forge_core::contract::Generator;

/// Immutable after startup; no locking needed.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn Generator>,
    pub settings: BatchSettings,
}

impl AppState {
    pub fn new(generator: Arc<dyn Generator>, settings: BatchSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }
}
