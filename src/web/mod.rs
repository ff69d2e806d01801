//! Web server module
//!
//! Provides the JSON search API plus liveness and connectivity probes.

mod handlers;
mod routes;
mod state;

pub use handlers::{payload_from_body, payload_from_query};
pub use routes::create_router;
pub use state::AppState;
