//! searxng-func: metasearch gateway with graceful degradation
//!
//! Requests fan out to a set of configured search engines. Per-engine
//! failures are recorded next to the results; when the engine set yields
//! nothing usable, a chain of direct fallback sources answers instead.

pub mod config;
pub mod engines;
pub mod error;
pub mod network;
pub mod query;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use engines::Engine;
pub use error::SearchError;
pub use results::{ResultContainer, SearchHit, SearchResponse};
pub use search::{Orchestrator, Search, SearchQuery};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
