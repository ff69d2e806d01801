//! Search execution across the configured engines

use super::models::{EngineRef, SearchQuery};
use crate::config::timeout_duration;
use crate::engines::{Engine, EngineRegistry, EngineResults, EngineTimeouts, RequestParams};
use crate::error::SearchError;
use crate::network::HttpClient;
use crate::query::FlatForm;
use crate::results::{EngineError, ResultContainer, Timing};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// What the engine set returns for one search
#[derive(Debug, Clone)]
pub struct EngineSetResult {
    /// The query as the engine set understood it
    pub query: SearchQuery,
    /// Ranked hits plus the engines that did not answer
    pub container: ResultContainer,
}

/// The primary provider of search results
#[async_trait]
pub trait EngineSet: Send + Sync {
    /// Search with a flat form `{q, engines, language, pageno, time_range, safesearch}`
    async fn search(&self, form: &FlatForm) -> Result<EngineSetResult, SearchError>;
}

/// How one engine's part of a search ended
struct EngineOutcome {
    name: String,
    elapsed: Duration,
    paging: bool,
    result: Result<EngineResults, EngineError>,
}

/// Search executor that coordinates searching across multiple engines
pub struct Search {
    client: HttpClient,
    registry: Arc<EngineRegistry>,
    default_timeout: Duration,
    max_timeout: Duration,
    default_lang: String,
    default_safesearch: u8,
}

impl Search {
    /// Create a new search executor
    pub fn new(client: HttpClient, registry: Arc<EngineRegistry>) -> Self {
        Self {
            client,
            registry,
            default_timeout: Duration::from_secs(5),
            max_timeout: Duration::from_secs(30),
            default_lang: "all".to_string(),
            default_safesearch: 0,
        }
    }

    /// Set default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set maximum timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    /// Apply both hardened timeouts
    pub fn with_timeouts(self, timeouts: EngineTimeouts) -> Self {
        self.with_timeout(timeouts.request)
            .with_max_timeout(timeouts.max_request)
    }

    /// Language and safe search level used when the form has none
    pub fn with_defaults(mut self, lang: impl Into<String>, safesearch: u8) -> Self {
        self.default_lang = lang.into();
        self.default_safesearch = safesearch.min(2);
        self
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Execute a search query across all specified engines
    pub async fn execute(&self, query: &SearchQuery) -> ResultContainer {
        let mut container = ResultContainer::with_weights(self.registry.weights());

        if query.is_empty() {
            return container;
        }

        let futures: Vec<_> = query
            .engine_refs
            .iter()
            .filter_map(|engine_ref| {
                let engine = self.registry.get(&engine_ref.name)?;
                Some(self.search_engine(engine.clone(), engine_ref, query))
            })
            .collect();

        debug!("Executing search '{}'", query.query);
        info!("Searching {} engines", futures.len());

        for outcome in join_all(futures).await {
            Self::collect(&mut container, outcome);
        }

        container
    }

    fn collect(container: &mut ResultContainer, outcome: EngineOutcome) {
        let EngineOutcome {
            name,
            elapsed,
            paging,
            result,
        } = outcome;

        match result {
            Ok(engine_results) => {
                let result_count = engine_results.results.len();
                container.extend_results(engine_results.results);
                for answer in engine_results.answers {
                    container.add_answer(answer);
                }
                for suggestion in engine_results.suggestions {
                    container.add_suggestion(suggestion);
                }
                for infobox in engine_results.infoboxes {
                    container.add_infobox(infobox);
                }
                if let Some(total) = engine_results.number_of_results {
                    container.add_number_of_results(total);
                }
                if paging {
                    container.set_paging();
                }
                container.add_timing(Timing {
                    engine: name.clone(),
                    time_ms: elapsed.as_millis() as u64,
                    result_count,
                });
                debug!(
                    "Engine {} returned {} results in {:?}",
                    name, result_count, elapsed
                );
            }
            Err(error) => container.add_unresponsive(name, error),
        }
    }

    /// Effective timeout for an engine, never above the maximum
    fn engine_timeout(&self, name: &str) -> Duration {
        let secs = self
            .registry
            .get_timeout(name, self.default_timeout.as_secs_f64());
        timeout_duration(secs).min(self.max_timeout)
    }

    /// Search a single engine
    async fn search_engine(
        &self,
        engine: Arc<dyn Engine>,
        engine_ref: &EngineRef,
        query: &SearchQuery,
    ) -> EngineOutcome {
        let name = engine_ref.name.clone();
        let start = Instant::now();
        let engine_timeout = self.engine_timeout(&name);

        debug!("Searching engine {} with timeout {:?}", name, engine_timeout);

        let params = RequestParams {
            query: query.query.clone(),
            pageno: query.pageno,
            lang: query.lang.clone(),
            safesearch: query.safesearch,
            time_range: query.time_range,
            category: engine_ref.category.clone(),
        };

        let result = match engine.request(&params) {
            Err(e) => {
                warn!("Failed to build request for {}: {}", name, e);
                Err(EngineError::Unknown)
            }
            Ok(request) => {
                match timeout(
                    engine_timeout,
                    self.client.execute_with_timeout(request, engine_timeout),
                )
                .await
                {
                    Ok(Ok(response)) => engine.response(response).map_err(|e| {
                        let error = EngineError::from_parse(&e.to_string());
                        debug!("Response from {} rejected: {:#}", name, e);
                        warn!("Failed to parse response from {}: {}", name, error);
                        error
                    }),
                    Ok(Err(e)) => {
                        let message = format!("{:#}", e);
                        debug!("Request for {} failed: {}", name, message);
                        let error = EngineError::from_transport(&message);
                        warn!("Request failed for {}: {}", name, error);
                        Err(error)
                    }
                    Err(_) => {
                        warn!("Timeout for engine {}", name);
                        Err(EngineError::Timeout)
                    }
                }
            }
        };

        EngineOutcome {
            name,
            elapsed: start.elapsed(),
            paging: engine.supports_paging(),
            result,
        }
    }
}

#[async_trait]
impl EngineSet for Search {
    async fn search(&self, form: &FlatForm) -> Result<EngineSetResult, SearchError> {
        let query = SearchQuery::from_form(
            form,
            &self.registry,
            &self.default_lang,
            self.default_safesearch,
        )?;
        let container = self.execute(&query).await;
        Ok(EngineSetResult { query, container })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, OutgoingSettings};
    use crate::engines::{EngineLoader, ProviderRegistration};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_config(name: &str, base: &str) -> EngineConfig {
        EngineConfig {
            name: name.to_string(),
            engine: "json".to_string(),
            search_url: format!("{}/{}", base, name),
            page_param: Some("page".to_string()),
            results: "items".to_string(),
            url: "link".to_string(),
            title: "title".to_string(),
            content: Some("body".to_string()),
            ..Default::default()
        }
    }

    fn search_for(configs: &[EngineConfig]) -> Search {
        let registrations: Vec<_> = configs.iter().map(ProviderRegistration::from_config).collect();
        let registry = EngineLoader::load(configs, &registrations).unwrap();
        let client = HttpClient::with_settings(&OutgoingSettings {
            force_ipv4: false,
            retries: 0,
            ..Default::default()
        })
        .unwrap();
        Search::new(client, Arc::new(registry)).with_timeout(Duration::from_millis(500))
    }

    fn form(pairs: &[(&str, &str)]) -> FlatForm {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_no_engines_registered() {
        let client = HttpClient::new().unwrap();
        let search = Search::new(client, Arc::new(EngineRegistry::new()));

        let query = SearchQuery::simple("test");
        let results = search.execute(&query).await;

        assert_eq!(results.result_count(), 0);
    }

    #[tokio::test]
    async fn test_fan_out_merges_and_records_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alpha"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"link": "https://www.rust-lang.org/", "title": "Rust", "body": "home"},
                    {"link": "https://crates.io/", "title": "crates.io"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/beta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"link": "https://www.rust-lang.org", "title": "Rust"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gamma"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/delta"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let configs: Vec<_> = ["alpha", "beta", "gamma", "delta"]
            .iter()
            .map(|n| engine_config(n, &server.uri()))
            .collect();
        let search = search_for(&configs);

        let result = search
            .search(&form(&[("q", "rust"), ("engines", "alpha,beta,gamma,delta")]))
            .await
            .unwrap();

        let hits = result.container.get_ordered_results();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.rust-lang.org/");
        assert_eq!(hits[0].engines.len(), 2);
        assert!(result.container.paging());

        let mut unresponsive: Vec<_> = result
            .container
            .get_unresponsive()
            .into_iter()
            .map(|u| (u.engine, u.error))
            .collect();
        unresponsive.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            unresponsive,
            vec![
                ("delta".to_string(), EngineError::Timeout),
                ("gamma".to_string(), EngineError::TooManyRequests),
            ]
        );
    }

    #[test]
    fn test_engine_timeout_survives_unusable_config() {
        let mut config = engine_config("alpha", "https://search.example");
        config.timeout = Some(f64::INFINITY);
        let search = search_for(&[config]).with_max_timeout(Duration::from_secs(6));
        assert_eq!(search.engine_timeout("alpha"), Duration::from_secs(6));

        let mut config = engine_config("beta", "https://search.example");
        config.timeout = Some(f64::NAN);
        let search = search_for(&[config]);
        assert_eq!(search.engine_timeout("beta"), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_invalid_form_is_an_error() {
        let search = search_for(&[engine_config("alpha", "https://search.example")]);
        let err = search
            .search(&form(&[("q", "rust"), ("pageno", "two")]))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidParameter(_)));
    }
}
