//! Primary search path: query the engine set and normalize what it returns

use super::executor::EngineSet;
use crate::error::SearchError;
use crate::query::QueryForm;
use crate::results::normalize::clean_hit;
use crate::results::{SearchMeta, SearchResponse};
use tracing::debug;

/// Normalized result of the primary path
#[derive(Debug, Clone)]
pub struct PrimaryOutcome {
    pub response: SearchResponse,
}

impl PrimaryOutcome {
    pub fn hit_count(&self) -> usize {
        self.response.results.len()
    }

    pub fn unresponsive_count(&self) -> usize {
        self.response.unresponsive_engines.len()
    }
}

/// Run the engine set for a form.
///
/// Hits keep the engine set's ranking; a positive `max_results` keeps only
/// the leading hits. Any engine set error is returned as-is.
pub async fn run_primary(
    engine_set: &dyn EngineSet,
    form: &QueryForm,
) -> Result<PrimaryOutcome, SearchError> {
    let result = engine_set.search(&form.to_form()).await?;
    let container = result.container;

    let mut results: Vec<_> = container
        .get_ordered_results()
        .into_iter()
        .map(clean_hit)
        .collect();
    if let Some(limit) = form.max_results {
        results.truncate(limit);
    }

    debug!(
        "Primary search for '{}' produced {} hits",
        form.text,
        results.len()
    );
    for timing in container.get_timings() {
        debug!(
            "{}: {} results in {} ms",
            timing.engine, timing.result_count, timing.time_ms
        );
    }

    Ok(PrimaryOutcome {
        response: SearchResponse {
            search: SearchMeta::from(&result.query),
            results,
            infoboxes: container.get_infoboxes(),
            suggestions: container.get_suggestions(),
            answers: container.get_answers(),
            paging: container.paging(),
            number_of_results: container.number_of_results(),
            unresponsive_engines: container.get_unresponsive(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FlatForm;
    use crate::results::{EngineError, RawResult, ResultContainer};
    use crate::search::{EngineSetResult, SearchQuery};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Engine set returning a fixed container and remembering the form
    struct Fixed {
        hits: usize,
        seen: Mutex<Option<FlatForm>>,
    }

    #[async_trait]
    impl EngineSet for Fixed {
        async fn search(&self, form: &FlatForm) -> Result<EngineSetResult, SearchError> {
            *self.seen.lock().unwrap() = Some(form.clone());
            let mut container = ResultContainer::new();
            for i in 0..self.hits {
                container.add_result(
                    RawResult::new(format!("https://r{i}.example/"), format!("R{i}"), "google".into())
                        .with_position(i as u32 + 1),
                );
            }
            container.add_unresponsive("bing", EngineError::Timeout);
            Ok(EngineSetResult {
                query: SearchQuery::simple(form.get("q").cloned().unwrap_or_default()),
                container,
            })
        }
    }

    fn form(max_results: Option<usize>) -> QueryForm {
        QueryForm {
            text: "rust".to_string(),
            providers: vec!["google".to_string(), "bing".to_string()],
            language: None,
            page: None,
            time_range: None,
            safety: Some("0".to_string()),
            max_results,
        }
    }

    #[tokio::test]
    async fn test_truncates_by_prefix() {
        let set = Fixed {
            hits: 5,
            seen: Mutex::new(None),
        };
        let outcome = run_primary(&set, &form(Some(2))).await.unwrap();

        assert_eq!(outcome.hit_count(), 2);
        assert_eq!(outcome.response.results[0].url, "https://r0.example/");
        assert_eq!(outcome.response.results[1].url, "https://r1.example/");
        assert_eq!(outcome.unresponsive_count(), 1);
        assert_eq!(outcome.response.search.q, "rust");
    }

    #[tokio::test]
    async fn test_passes_flat_form() {
        let set = Fixed {
            hits: 1,
            seen: Mutex::new(None),
        };
        run_primary(&set, &form(None)).await.unwrap();

        let seen = set.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.get("engines").map(String::as_str), Some("google,bing"));
        assert_eq!(seen.get("safesearch").map(String::as_str), Some("0"));
        assert!(!seen.contains_key("pageno"));
    }

    #[tokio::test]
    async fn test_hits_are_normalized() {
        let set = Fixed {
            hits: 1,
            seen: Mutex::new(None),
        };
        let outcome = run_primary(&set, &form(None)).await.unwrap();
        let hit = &outcome.response.results[0];
        assert_eq!(hit.content, "");
        assert_eq!(hit.template, "default.html");
        assert_eq!(hit.extra.get("engines"), Some(&serde_json::json!(["google"])));
    }
}
