//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use susu_core::engine::SusuEngine;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// The pool engine. All clones share the same pool state.
    pub engine: SusuEngine,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
}

impl AppState {
    /// Create a new AppState with the given engine and configuration.
    pub fn new(engine: SusuEngine, config: SharedConfig) -> Self {
        Self { engine, config }
    }
}
