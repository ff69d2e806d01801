//! Search engine module
//!
//! Defines the Engine trait, the configuration-driven engine kinds and the
//! registry the search executor resolves providers against.

mod css;
mod hardening;
mod json;
mod loader;
mod registry;
mod request;
mod traits;

pub use css::CssEngine;
pub use hardening::{harden, EngineTimeouts, TRUSTED_ENGINES};
pub use json::JsonEngine;
pub use loader::EngineLoader;
pub use registry::{EngineRegistry, ProviderRegistration};
pub use traits::*;
