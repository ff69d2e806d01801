//! Result type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use url::Url;

/// A hit as produced by an engine, before normalization.
///
/// Carries bookkeeping the client never sees: the parsed URL cache, per-engine
/// positions and loosely typed extras.
#[derive(Debug, Clone)]
pub struct RawResult {
    /// The URL of the result
    pub url: String,
    /// Parsed URL, internal only
    pub parsed_url: Option<Url>,
    /// The title of the result
    pub title: String,
    /// Content snippet
    pub content: Option<String>,
    /// Engine that first returned this result
    pub engine: String,
    /// All engines that returned this result (after merging)
    pub engines: HashSet<String>,
    /// Positions in each engine's results
    pub positions: Vec<u32>,
    /// Calculated relevance score
    pub score: f64,
    /// Category of the result
    pub category: Option<String>,
    /// Template to use for rendering
    pub template: Option<String>,
    /// Additional engine-specific fields
    pub extra: BTreeMap<String, ExtraValue>,
}

impl RawResult {
    /// Create a new result
    pub fn new(url: String, title: String, engine: String) -> Self {
        let parsed_url = Url::parse(&url).ok();
        let mut engines = HashSet::new();
        engines.insert(engine.clone());

        Self {
            url,
            parsed_url,
            title,
            content: None,
            engine,
            engines,
            positions: vec![],
            score: 0.0,
            category: None,
            template: None,
            extra: BTreeMap::new(),
        }
    }

    /// Add content to the result
    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    /// Add a position
    pub fn with_position(mut self, position: u32) -> Self {
        self.positions.push(position);
        self
    }

    /// Attach an extra field
    pub fn with_extra(mut self, key: impl Into<String>, value: ExtraValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Get the hostname from the URL
    pub fn hostname(&self) -> Option<&str> {
        self.parsed_url.as_ref().and_then(|u| u.host_str())
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: &RawResult) {
        self.engines.extend(other.engines.iter().cloned());
        self.positions.extend(other.positions.iter().copied());

        if self.content.is_none() && other.content.is_some() {
            self.content = other.content.clone();
        }
        for (key, value) in &other.extra {
            self.extra.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Calculate the score based on positions and engine weights
    pub fn calculate_score(&mut self, engine_weights: &HashMap<String, f64>) {
        let mut weight = 1.0;

        for engine in &self.engines {
            if let Some(w) = engine_weights.get(engine) {
                weight *= w;
            }
        }

        weight *= self.engines.len() as f64;

        self.score = self.positions.iter().map(|&pos| weight / pos as f64).sum();
    }
}

/// Loosely typed value attached to a raw hit.
///
/// Every variant has a fixed JSON rendering, see
/// [`crate::results::normalize::extra_to_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    Set(HashSet<String>),
    List(Vec<ExtraValue>),
    /// A value with no dedicated variant, kept as its string representation
    Other(String),
}

impl ExtraValue {
    /// Wrap any displayable value
    pub fn display(value: &impl std::fmt::Display) -> Self {
        Self::Other(value.to_string())
    }
}

/// An answer result (calculator, definition, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text
    pub answer: String,
    /// Source engine
    pub engine: String,
    /// URL for more info
    pub url: Option<String>,
}

impl Answer {
    pub fn new(answer: String, engine: String) -> Self {
        Self {
            answer,
            engine,
            url: None,
        }
    }
}

/// An infobox result (Wikipedia sidebar, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoBox {
    /// Infobox ID
    pub id: String,
    /// Title
    pub title: String,
    /// Content
    pub content: Option<String>,
    /// Image URL
    pub img_src: Option<String>,
    /// Source URL
    pub url: Option<String>,
    /// Source engine
    pub engine: String,
}

/// Engine response timing information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    /// Engine name
    pub engine: String,
    /// Response time in milliseconds
    pub time_ms: u64,
    /// Number of results returned
    pub result_count: usize,
}

/// Why an engine did not answer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngineError {
    Timeout,
    NetworkError,
    HttpError,
    ParseError,
    AccessDenied,
    Captcha,
    TooManyRequests,
    Unknown,
}

impl EngineError {
    /// Classify a transport error by its message
    pub fn from_transport(message: &str) -> Self {
        if message.contains("timed out") || message.contains("timeout") {
            Self::Timeout
        } else if message.contains("429") {
            Self::TooManyRequests
        } else if message.contains("403") {
            Self::AccessDenied
        } else {
            Self::NetworkError
        }
    }

    /// Classify a response parsing error by its message
    pub fn from_parse(message: &str) -> Self {
        if message.contains("CAPTCHA") {
            Self::Captcha
        } else if message.contains("HTTP error 429") {
            Self::TooManyRequests
        } else if message.contains("HTTP error 403") {
            Self::AccessDenied
        } else if message.contains("HTTP error") {
            Self::HttpError
        } else {
            Self::ParseError
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "Request timed out"),
            Self::NetworkError => write!(f, "Network error"),
            Self::HttpError => write!(f, "HTTP error"),
            Self::ParseError => write!(f, "Failed to parse response"),
            Self::AccessDenied => write!(f, "Access denied"),
            Self::Captcha => write!(f, "CAPTCHA required"),
            Self::TooManyRequests => write!(f, "Too many requests"),
            Self::Unknown => write!(f, "Unknown error"),
        }
    }
}

/// An engine that failed or timed out during a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresponsiveEngine {
    pub engine: String,
    pub error: EngineError,
}

/// One normalized, client-facing result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub content: String,
    pub engine: String,
    pub template: String,
    pub score: f64,
    pub category: String,
    /// Normalized engine-specific fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SearchHit {
    /// Build a hit with no extra fields
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        engine: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            engine: engine.into(),
            template: "default.html".to_string(),
            score,
            category: "general".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_collects_engines_and_positions() {
        let mut a = RawResult::new(
            "https://example.com".to_string(),
            "Example".to_string(),
            "google".to_string(),
        )
        .with_position(1);
        let b = RawResult::new(
            "https://example.com/".to_string(),
            "Example".to_string(),
            "bing".to_string(),
        )
        .with_position(3)
        .with_content("snippet".to_string());

        a.merge(&b);

        assert_eq!(a.engines.len(), 2);
        assert_eq!(a.positions, vec![1, 3]);
        assert_eq!(a.content.as_deref(), Some("snippet"));
    }

    #[test]
    fn test_score_favours_top_positions() {
        let weights = HashMap::new();
        let mut first = RawResult::new("https://a.com".into(), "A".into(), "google".into())
            .with_position(1);
        let mut fifth = RawResult::new("https://b.com".into(), "B".into(), "google".into())
            .with_position(5);
        first.calculate_score(&weights);
        fifth.calculate_score(&weights);
        assert!(first.score > fifth.score);
    }

    #[test]
    fn test_engine_error_classification() {
        assert_eq!(
            EngineError::from_transport("operation timed out"),
            EngineError::Timeout
        );
        assert_eq!(
            EngineError::from_transport("status 429"),
            EngineError::TooManyRequests
        );
        assert_eq!(EngineError::from_parse("HTTP error: 503"), EngineError::HttpError);
        assert_eq!(
            EngineError::from_parse("CAPTCHA detected"),
            EngineError::Captcha
        );
    }

    #[test]
    fn test_engine_error_serializes_as_token() {
        let json = serde_json::to_string(&EngineError::TooManyRequests).unwrap();
        assert_eq!(json, "\"too_many_requests\"");
    }

    #[test]
    fn test_hostname() {
        let r = RawResult::new(
            "https://www.rust-lang.org/learn".into(),
            "Rust".into(),
            "bing".into(),
        );
        assert_eq!(r.hostname(), Some("www.rust-lang.org"));
    }
}
