//! HTTP networking module
//!
//! Provides the outbound HTTP client and a connectivity diagnostic.

mod client;
mod netcheck;
mod user_agent;

pub use client::HttpClient;
pub use netcheck::{connectivity_report, NetReport};
pub use user_agent::{accept_html, accept_json, generate_user_agent};
