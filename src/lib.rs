pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod orchestrator;

use std::sync::Arc;
use config::Config;
use orchestrator::Orchestrator;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let orchestrator = Orchestrator::from_config(&config);
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
