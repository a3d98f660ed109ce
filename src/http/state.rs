use std::sync::Arc;
use std::time::Duration;

use crate::capture::CaptureSupervisor;
use crate::config::Settings;
use crate::store::ConfigStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<ConfigStore>,
    pub supervisor: Arc<CaptureSupervisor>,
}

impl AppState {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.settings.catalog.freshness_secs)
    }
}
