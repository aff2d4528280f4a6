//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::matchmaking::Registry;
use crate::ws::SessionTable;

/// Handles shared by the HTTP routes, the gateway, and the tick loop.
/// Cloning is cheap; everything inside is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<Registry>,
    pub sessions: Arc<SessionTable>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(Registry::new()),
            sessions: Arc::new(SessionTable::new()),
        }
    }
}
