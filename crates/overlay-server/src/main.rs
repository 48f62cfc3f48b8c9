//! HTTP host for the Overwarn overlay.
//!
//! Polls the alert feed, runs one overlay session, and serves its display
//! frames to a browser source. The browser reports text overflow back through
//! `/api/measure`.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use alert_core::OverlayParams;
use nws_feed::{FeedConfig, FeedPoller, NwsClient};
use overlay_engine::{OverlaySession, SessionConfig};
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let feed_config = FeedConfig::from_env()?;
    let session_config = SessionConfig::from_env()?;
    info!(
        addr = %config.addr,
        feed = %feed_config.url,
        version = env!("CARGO_PKG_VERSION"),
        "Starting overlay server"
    );

    // Start polling the feed
    let poll_interval = feed_config.poll_interval;
    let client = NwsClient::new(feed_config)?;
    let (docs, poller) = FeedPoller::new(Arc::new(client))
        .with_poll_interval(poll_interval)
        .spawn();

    // Start the overlay session
    let params = OverlayParams::from_query(&config.query);
    let (session, session_task) = OverlaySession::new(session_config, params).spawn(docs);

    // Build router
    let state = AppState::new(session.clone());
    let app = routes::router()
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Overlay server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Tear down the session before the poller so no frame outlives it
    if let Err(e) = session.shutdown().await {
        warn!("Session already stopped: {}", e);
    }
    if let Err(e) = session_task.await {
        warn!("Session task failed: {}", e);
    }
    poller.abort();
    info!("Overlay server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
