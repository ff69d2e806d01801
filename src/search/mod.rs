//! Search orchestration module
//!
//! The engine set fans a query out to the configured engines; the
//! orchestrator decides whether its answer is usable or the fallback
//! sources have to step in.

mod executor;
pub mod fallback;
mod models;
mod orchestrator;
mod primary;

pub use executor::{EngineSet, EngineSetResult, Search};
pub use fallback::{FallbackSearch, FallbackSource, InstantAnswerSource, SyntheticSource};
pub use models::*;
pub use orchestrator::{Initializer, Orchestrator, PrimaryVerdict};
pub use primary::{run_primary, PrimaryOutcome};
