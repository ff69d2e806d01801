//! Result container for aggregating and deduplicating engine results

use super::types::*;
use std::collections::{BTreeSet, HashMap};

/// Accumulates the answers of every engine taking part in one search.
///
/// Owned by a single search; engines report into it after the fan-out
/// completes, so no locking is involved.
#[derive(Debug, Clone, Default)]
pub struct ResultContainer {
    /// Results in first-seen order
    results: Vec<RawResult>,
    /// Normalized URL -> index into `results`
    index: HashMap<String, usize>,
    answers: Vec<Answer>,
    suggestions: BTreeSet<String>,
    infoboxes: Vec<InfoBox>,
    unresponsive_engines: Vec<UnresponsiveEngine>,
    timings: Vec<Timing>,
    engine_weights: HashMap<String, f64>,
    paging: bool,
    reported_totals: Vec<u64>,
}

impl ResultContainer {
    /// Create a new empty result container
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with engine weights
    pub fn with_weights(weights: HashMap<String, f64>) -> Self {
        Self {
            engine_weights: weights,
            ..Self::default()
        }
    }

    /// Add a result, merging with existing if URL matches
    pub fn add_result(&mut self, result: RawResult) {
        let key = Self::url_hash(&result);
        match self.index.get(&key) {
            Some(&i) => self.results[i].merge(&result),
            None => {
                self.index.insert(key, self.results.len());
                self.results.push(result);
            }
        }
    }

    /// Add multiple results
    pub fn extend_results(&mut self, results: impl IntoIterator<Item = RawResult>) {
        for result in results {
            self.add_result(result);
        }
    }

    /// Add an answer, skipping duplicates
    pub fn add_answer(&mut self, answer: Answer) {
        if !self.answers.iter().any(|a| a.answer == answer.answer) {
            self.answers.push(answer);
        }
    }

    /// Add a suggestion
    pub fn add_suggestion(&mut self, suggestion: String) {
        self.suggestions.insert(suggestion);
    }

    /// Add an infobox, keeping the richer one when ids collide
    pub fn add_infobox(&mut self, infobox: InfoBox) {
        if let Some(existing) = self.infoboxes.iter_mut().find(|b| b.id == infobox.id) {
            let len = |b: &InfoBox| b.content.as_ref().map(|c| c.len()).unwrap_or(0);
            if len(&infobox) > len(existing) {
                *existing = infobox;
            }
        } else {
            self.infoboxes.push(infobox);
        }
    }

    /// Record an unresponsive engine
    pub fn add_unresponsive(&mut self, engine: impl Into<String>, error: EngineError) {
        self.unresponsive_engines.push(UnresponsiveEngine {
            engine: engine.into(),
            error,
        });
    }

    /// Record engine timing
    pub fn add_timing(&mut self, timing: Timing) {
        self.timings.push(timing);
    }

    /// Mark that at least one answering engine supports paging
    pub fn set_paging(&mut self) {
        self.paging = true;
    }

    /// Record a total-results figure reported by an engine
    pub fn add_number_of_results(&mut self, total: u64) {
        self.reported_totals.push(total);
    }

    /// Get all results sorted by score.
    ///
    /// The sort is stable, so equally scored results keep first-seen order.
    pub fn get_ordered_results(&self) -> Vec<RawResult> {
        let mut results = self.results.clone();

        for result in &mut results {
            result.calculate_score(&self.engine_weights);
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        results
    }

    pub fn get_answers(&self) -> Vec<Answer> {
        self.answers.clone()
    }

    /// Suggestions in sorted order
    pub fn get_suggestions(&self) -> Vec<String> {
        self.suggestions.iter().cloned().collect()
    }

    pub fn get_infoboxes(&self) -> Vec<InfoBox> {
        self.infoboxes.clone()
    }

    pub fn get_unresponsive(&self) -> Vec<UnresponsiveEngine> {
        self.unresponsive_engines.clone()
    }

    pub fn get_timings(&self) -> Vec<Timing> {
        self.timings.clone()
    }

    pub fn paging(&self) -> bool {
        self.paging
    }

    /// Largest total reported by any engine, 0 when none reported one
    pub fn number_of_results(&self) -> u64 {
        self.reported_totals.iter().copied().max().unwrap_or(0)
    }

    /// Get total result count
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Key under which a URL counts as a duplicate: scheme and a leading
    /// `www.` are ignored, as is a trailing slash
    fn url_hash(result: &RawResult) -> String {
        match (&result.parsed_url, result.hostname()) {
            (Some(url), Some(host)) => {
                let host = host.strip_prefix("www.").unwrap_or(host);
                let mut key = format!("{}{}", host, url.path().trim_end_matches('/'));
                if let Some(query) = url.query() {
                    key.push('?');
                    key.push_str(query);
                }
                key
            }
            _ => result.url.trim_end_matches('/').to_lowercase(),
        }
    }
}
