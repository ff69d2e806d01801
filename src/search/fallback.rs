//! Fallback search used when the engine set produced nothing usable
//!
//! Sources are tried in order, one after the other, until the result quota
//! is full. A failing source only loses its own contribution.

use crate::config::{timeout_duration, FallbackSettings};
use crate::engines::EngineRequest;
use crate::error::SearchError;
use crate::network::{accept_json, HttpClient};
use crate::results::{EngineError, SearchHit, SearchMeta, SearchResponse};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// A secondary source of hits
#[async_trait]
pub trait FallbackSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Fetch at most `quota` hits for `query`
    async fn fetch(&self, query: &str, quota: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Instant-answer API response, only the fields we read
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    heading: String,
    #[serde(rename = "Abstract")]
    abstract_: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    related_topics: Vec<serde_json::Value>,
}

/// DuckDuckGo Instant Answer API
pub struct InstantAnswerSource {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl InstantAnswerSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> SearchError {
        SearchError::FallbackSource {
            source_name: self.name().to_string(),
            message: message.to_string(),
        }
    }

    fn parse(answer: InstantAnswer, query: &str, quota: usize) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        if !answer.abstract_.is_empty() {
            let title = if answer.heading.is_empty() {
                query.to_string()
            } else {
                answer.heading
            };
            hits.push(SearchHit::new(
                answer.abstract_url,
                title,
                answer.abstract_,
                "duckduckgo",
                1.0,
            ));
        }

        let remaining = quota.saturating_sub(hits.len());
        for topic in answer.related_topics.iter().take(remaining) {
            let Some(url) = topic.get("FirstURL").and_then(|u| u.as_str()) else {
                continue;
            };
            if url.is_empty() {
                continue;
            }
            let text = topic.get("Text").and_then(|t| t.as_str()).unwrap_or_default();
            let title = text.split(" - ").next().unwrap_or(text);
            hits.push(SearchHit::new(url, title, text, "duckduckgo", 0.8));
        }

        hits
    }
}

#[async_trait]
impl FallbackSource for InstantAnswerSource {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn fetch(&self, query: &str, quota: usize) -> Result<Vec<SearchHit>, SearchError> {
        let request = EngineRequest::get(&self.base_url)
            .param("q", query)
            .param("format", "json")
            .param("no_html", "1")
            .param("skip_disambig", "1")
            .header("Accept", accept_json());

        let response = self
            .client
            .execute_with_timeout(request, self.timeout)
            .await
            .map_err(|e| {
                let message = format!("{:#}", e);
                debug!("Instant answer request failed: {}", message);
                self.error(EngineError::from_transport(&message))
            })?;
        if !response.is_success() {
            return Err(self.error(format!("HTTP error {}", response.status)));
        }

        let answer: InstantAnswer = response.json().map_err(|e| self.error(e))?;
        Ok(Self::parse(answer, query, quota))
    }
}

/// One hit pointing at a search page for the query; needs no network
pub struct SyntheticSource {
    base_url: String,
}

impl SyntheticSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FallbackSource for SyntheticSource {
    fn name(&self) -> &str {
        "google_mock"
    }

    async fn fetch(&self, query: &str, quota: usize) -> Result<Vec<SearchHit>, SearchError> {
        if quota == 0 {
            return Ok(Vec::new());
        }
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        Ok(vec![SearchHit::new(
            format!("{}?q={}", self.base_url, encoded),
            format!("Search results for: {}", query),
            format!("Find information about {} and related topics.", query),
            "google_mock",
            0.5,
        )])
    }
}

/// Sequential chain of fallback sources
pub struct FallbackSearch {
    sources: Vec<Box<dyn FallbackSource>>,
    default_max_results: usize,
}

impl FallbackSearch {
    /// Instant-answer source followed by the synthetic source
    pub fn new(client: HttpClient, settings: &FallbackSettings) -> Self {
        let timeout = timeout_duration(settings.timeout).min(client.read_timeout());
        let instant_answer = InstantAnswerSource::new(
            client,
            settings.instant_answer_url.clone(),
            timeout,
        );
        let synthetic = SyntheticSource::new(settings.synthetic_url.clone());
        let sources: Vec<Box<dyn FallbackSource>> =
            vec![Box::new(instant_answer) as Box<dyn FallbackSource>, Box::new(synthetic)];
        Self::with_sources(
            sources,
            settings.default_max_results,
        )
    }

    /// Chain of arbitrary sources, tried in the given order
    pub fn with_sources(sources: Vec<Box<dyn FallbackSource>>, default_max_results: usize) -> Self {
        Self {
            sources,
            default_max_results: default_max_results.max(1),
        }
    }

    /// Gather up to `max_results` hits. Never fails.
    pub async fn run(&self, query: &str, max_results: Option<usize>) -> SearchResponse {
        let cap = max_results
            .filter(|n| *n > 0)
            .unwrap_or(self.default_max_results);
        let mut results: Vec<SearchHit> = Vec::new();

        for source in &self.sources {
            if results.len() >= cap {
                break;
            }
            match source.fetch(query, cap - results.len()).await {
                Ok(hits) => {
                    debug!("Fallback source {} returned {} hits", source.name(), hits.len());
                    results.extend(hits);
                }
                Err(e) => warn!("{}", e),
            }
        }

        let gathered = results.len() as u64;
        results.truncate(cap);

        SearchResponse::hits_only(
            SearchMeta {
                q: query.to_string(),
                pageno: 1,
                lang: "en".to_string(),
                safesearch: 0,
                timerange: None,
            },
            results,
            gathered,
        )
    }
}
