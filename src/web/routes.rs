//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/websearch",
            get(handlers::websearch_get).post(handlers::websearch_post),
        )
        .route("/api/ping", get(handlers::ping))
        .route("/api/netcheck", get(handlers::netcheck))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}
