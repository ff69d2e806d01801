//! Client-facing response schema

use super::types::{Answer, InfoBox, SearchHit, UnresponsiveEngine};
use serde::{Deserialize, Serialize};

/// Echo of the query that produced a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMeta {
    pub q: String,
    pub pageno: u32,
    pub lang: String,
    pub safesearch: u8,
    pub timerange: Option<String>,
}

/// Stable output contract shared by the primary and fallback paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub search: SearchMeta,
    pub results: Vec<SearchHit>,
    pub infoboxes: Vec<InfoBox>,
    pub suggestions: Vec<String>,
    pub answers: Vec<Answer>,
    pub paging: bool,
    pub number_of_results: u64,
    pub unresponsive_engines: Vec<UnresponsiveEngine>,
}

impl SearchResponse {
    /// A response carrying only hits, as the fallback path produces
    pub fn hits_only(search: SearchMeta, results: Vec<SearchHit>, number_of_results: u64) -> Self {
        Self {
            search,
            results,
            infoboxes: Vec::new(),
            suggestions: Vec::new(),
            answers: Vec::new(),
            paging: false,
            number_of_results,
            unresponsive_engines: Vec::new(),
        }
    }
}
