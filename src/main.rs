//! searxng-func: metasearch gateway
//!
//! This is the main entry point for the application.

use anyhow::Result;
use searxng_func::{
    config,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting searxng-func v{}", searxng_func::VERSION);

    // Load configuration
    let settings = config::load()?;
    info!(
        "Configured {} engines, defaults: {}",
        settings.engines.len(),
        settings.search.default_engines.join(",")
    );

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    // Engines are loaded lazily on the first search
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    let state = AppState::new(settings, client);
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
