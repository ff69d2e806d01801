//! Error taxonomy for the search pipeline
//!
//! Only [`SearchError::Validation`] is meant to reach the caller as-is. Every
//! other variant is absorbed by the layer that produced it: engine set
//! failures degrade to the fallback path, fallback source failures shrink the
//! fallback result set.

/// Errors produced by the search pipeline
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request cannot be searched (empty or missing query)
    #[error("{0}")]
    Validation(String),

    /// The engine set could not be brought up
    #[error("engine set initialization failed: {0}")]
    ProviderInit(String),

    /// The flat form handed to the engine set holds an unusable value
    #[error("invalid search parameter: {0}")]
    InvalidParameter(String),

    /// A fallback source failed; only that source's contribution is lost
    #[error("fallback source {source_name} failed: {message}")]
    FallbackSource { source_name: String, message: String },

    /// The response could not be turned into JSON
    #[error("failed to serialize response: {0}")]
    Serialization(String),
}

impl SearchError {
    /// The error returned when the query text is empty after trimming
    pub fn missing_query() -> Self {
        Self::Validation("Missing required field: query".to_string())
    }

    /// Whether this error belongs to the client rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
