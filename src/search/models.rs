//! Search query and related data models

use crate::config::split_list;
use crate::engines::EngineRegistry;
use crate::error::SearchError;
use crate::query::{FlatForm, TimeRange};
use crate::results::SearchMeta;
use serde::{Deserialize, Serialize};

/// Reference to an engine with its category context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EngineRef {
    /// Engine name
    pub name: String,
    /// Category context for this engine
    pub category: String,
}

impl EngineRef {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// Complete search query with all parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search query string
    pub query: String,
    /// Engines to search, resolved and deduplicated
    pub engine_refs: Vec<EngineRef>,
    /// Language code
    pub lang: String,
    /// Safe search level (0, 1, 2)
    pub safesearch: u8,
    /// Page number (1-indexed)
    pub pageno: u32,
    /// Time range filter
    pub time_range: Option<TimeRange>,
}

impl SearchQuery {
    /// Parse the flat form handed to the engine set.
    ///
    /// Requested engines are resolved against the registry; unknown and
    /// disabled ones are dropped. Unusable values for `pageno`,
    /// `safesearch` or `time_range` are rejected.
    pub fn from_form(
        form: &FlatForm,
        registry: &EngineRegistry,
        default_lang: &str,
        default_safesearch: u8,
    ) -> Result<Self, SearchError> {
        let query = form
            .get("q")
            .map(|q| q.trim().to_string())
            .unwrap_or_default();

        let mut engine_refs: Vec<EngineRef> = Vec::new();
        for requested in form.get("engines").map(|e| split_list(e)).unwrap_or_default() {
            let Some(name) = registry.resolve(&requested) else {
                continue;
            };
            if engine_refs.iter().any(|e| e.name == name) {
                continue;
            }
            let category = registry
                .registration(name)
                .map(|r| r.category().to_string())
                .unwrap_or_else(|| "general".to_string());
            engine_refs.push(EngineRef::new(name, category));
        }

        let lang = form
            .get("language")
            .filter(|l| !l.is_empty())
            .cloned()
            .unwrap_or_else(|| default_lang.to_string());

        let pageno = match form.get("pageno") {
            None => 1,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| {
                    SearchError::InvalidParameter(format!("pageno: invalid value {raw:?}"))
                })?,
        };

        let safesearch = match form.get("safesearch") {
            None => default_safesearch,
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|s| *s <= 2)
                .ok_or_else(|| {
                    SearchError::InvalidParameter(format!("safesearch: invalid value {raw:?}"))
                })?,
        };

        let time_range = match form.get("time_range").map(|t| t.trim()) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<TimeRange>()?),
        };

        Ok(Self {
            query,
            engine_refs,
            lang,
            safesearch,
            pageno,
            time_range,
        })
    }

    /// Create a simple query for a single string
    pub fn simple(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            engine_refs: vec![],
            lang: "all".to_string(),
            safesearch: 0,
            pageno: 1,
            time_range: None,
        }
    }

    /// Check if query is empty
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
    }
}

impl From<&SearchQuery> for SearchMeta {
    fn from(query: &SearchQuery) -> Self {
        Self {
            q: query.query.clone(),
            pageno: query.pageno,
            lang: query.lang.clone(),
            safesearch: query.safesearch,
            timerange: query.time_range.map(|t| t.as_str().to_string()),
        }
    }
}
