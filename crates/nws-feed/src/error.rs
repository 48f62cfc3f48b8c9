//! Error types for nws-feed.

use thiserror::Error;

/// Errors that can occur while fetching the alert feed.
///
/// Every variant is recoverable: the poller logs it and tries again on the
/// next tick.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("Feed returned status {status}")]
    Status { status: u16 },

    /// The body was not a feed document.
    #[error("Parse error: {0}")]
    Parse(#[from] alert_core::CoreError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
