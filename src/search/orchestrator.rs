//! Degradation policy: primary engine set first, fallback sources on total failure

use super::executor::{EngineSet, Search};
use super::fallback::FallbackSearch;
use super::primary::{run_primary, PrimaryOutcome};
use crate::config::Settings;
use crate::engines::{harden, EngineLoader, ProviderRegistration};
use crate::error::SearchError;
use crate::network::HttpClient;
use crate::query::{Payload, QueryForm};
use crate::results::SearchResponse;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Builds the engine set on first use
pub type Initializer =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EngineSet>, SearchError>> + Send + Sync>;

/// How the primary path went
#[derive(Debug)]
pub enum PrimaryVerdict {
    /// Return the primary response as-is, partial failures included
    Usable(PrimaryOutcome),
    /// Nothing usable came back; the reason is only logged
    TotalFailure(String),
}

impl PrimaryVerdict {
    /// A hard error, or no hits while some engine did not answer, is a total failure
    pub fn classify(primary: Result<PrimaryOutcome, SearchError>) -> Self {
        match primary {
            Err(e) => Self::TotalFailure(e.to_string()),
            Ok(outcome) if outcome.hit_count() == 0 && outcome.unresponsive_count() > 0 => {
                let engines: Vec<_> = outcome
                    .response
                    .unresponsive_engines
                    .iter()
                    .map(|u| format!("{} ({})", u.engine, u.error))
                    .collect();
                Self::TotalFailure(format!("no results, unresponsive: {}", engines.join(", ")))
            }
            Ok(outcome) => Self::Usable(outcome),
        }
    }
}

/// Entry point of a search request
pub struct Orchestrator {
    engine_set: OnceCell<Arc<dyn EngineSet>>,
    initializer: Initializer,
    fallback: FallbackSearch,
    default_providers: Vec<String>,
}

impl Orchestrator {
    /// Orchestrator whose engine set is built from `settings` on first use
    pub fn new(settings: Arc<Settings>, client: HttpClient) -> Self {
        let fallback = FallbackSearch::new(client.clone(), &settings.fallback);
        let default_providers = settings.search.default_engines.clone();

        let initializer: Initializer = Box::new(move || {
            let settings = settings.clone();
            let client = client.clone();
            async move { bootstrap(&settings, client) }.boxed()
        });

        Self::with_initializer(initializer, fallback, default_providers)
    }

    pub fn with_initializer(
        initializer: Initializer,
        fallback: FallbackSearch,
        default_providers: Vec<String>,
    ) -> Self {
        Self {
            engine_set: OnceCell::new(),
            initializer,
            fallback,
            default_providers,
        }
    }

    /// Whether the engine set has been built
    pub fn is_ready(&self) -> bool {
        self.engine_set.initialized()
    }

    /// The engine set, built once. A failed build leaves it unbuilt.
    async fn engine_set(&self) -> Result<Arc<dyn EngineSet>, SearchError> {
        self.engine_set
            .get_or_try_init(|| (self.initializer)())
            .await
            .cloned()
    }

    /// Run a search for a client payload.
    ///
    /// Only validation errors reach the caller; every other failure ends in
    /// the fallback response.
    pub async fn search(&self, payload: &Payload) -> Result<SearchResponse, SearchError> {
        let form = QueryForm::build(payload, &self.default_providers)?;

        let primary = match self.engine_set().await {
            Ok(engine_set) => run_primary(engine_set.as_ref(), &form).await,
            Err(e) => Err(e),
        };

        match PrimaryVerdict::classify(primary) {
            PrimaryVerdict::Usable(outcome) => Ok(outcome.response),
            PrimaryVerdict::TotalFailure(reason) => {
                warn!("Primary search failed, using fallback: {}", reason);
                Ok(self.fallback.run(&form.text, form.max_results).await)
            }
        }
    }
}

/// Probe, harden and load the configured engines
fn bootstrap(settings: &Settings, client: HttpClient) -> Result<Arc<dyn EngineSet>, SearchError> {
    let known_good = EngineLoader::probe(&settings.engines);

    let mut registrations: Vec<_> = settings
        .engines
        .iter()
        .map(ProviderRegistration::from_config)
        .collect();
    let disabled: HashSet<String> = settings
        .search
        .disabled_engines
        .iter()
        .map(|e| e.to_lowercase())
        .collect();
    let timeouts = harden(&mut registrations, &disabled, &known_good, &settings.outgoing);

    let registry = EngineLoader::load(&settings.engines, &registrations)?;
    info!(
        "Engine set ready: {} (timeout {:?}, max {:?})",
        registry.enabled().join(", "),
        timeouts.request,
        timeouts.max_request
    );

    let search = Search::new(client, Arc::new(registry))
        .with_timeouts(timeouts)
        .with_defaults(settings.search.default_lang.clone(), settings.search.safe_search);
    Ok(Arc::new(search))
}
