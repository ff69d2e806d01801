//! Application state shared across handlers

use crate::config::Settings;
use crate::network::HttpClient;
use crate::search::Orchestrator;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search entry point, owning the lazily built engine set
    pub orchestrator: Arc<Orchestrator>,
    /// Outbound client, used directly by the connectivity check
    pub client: HttpClient,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, client: HttpClient) -> Self {
        let settings = Arc::new(settings);
        let orchestrator = Arc::new(Orchestrator::new(settings.clone(), client.clone()));

        Self {
            settings,
            orchestrator,
            client,
        }
    }

    /// State around an already built orchestrator
    pub fn with_orchestrator(
        settings: Settings,
        client: HttpClient,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            orchestrator: Arc::new(orchestrator),
            client,
        }
    }
}
