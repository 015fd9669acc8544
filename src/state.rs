//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::facts::FactStore;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Both fields are frozen after startup, so handlers read them without
/// any locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub facts: Arc<FactStore>,
}

impl AppState {
    /// Creates a new application state from the resolved configuration and loaded facts.
    pub fn new(config: Config, facts: FactStore) -> Self {
        Self {
            config: Arc::new(config),
            facts: Arc::new(facts),
        }
    }
}
