use std::sync::Arc;

use crate::config::Config;
use crate::state::DeviceRegistry;

/// Shared application state available to all handlers via `State<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DeviceRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(registry: DeviceRegistry, config: Config) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}
