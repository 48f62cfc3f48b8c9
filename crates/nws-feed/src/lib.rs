//! Polling client for the weather.gov active alerts feed.
//!
//! - [`NwsClient`] - fetches and parses the feed over HTTP
//! - [`FeedSource`] - the trait the overlay consumes, so tests can script responses
//! - [`FeedPoller`] - fetches on a fixed interval and forwards only successes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nws_feed::{FeedConfig, FeedPoller, NwsClient};
//!
//! # async fn example() -> Result<(), nws_feed::FeedError> {
//! let config = FeedConfig::from_env()?;
//! let interval = config.poll_interval;
//! let client = NwsClient::new(config)?;
//!
//! let (mut docs, _task) = FeedPoller::new(Arc::new(client))
//!     .with_poll_interval(interval)
//!     .spawn();
//! while let Some(doc) = docs.recv().await {
//!     println!("{} active alerts", doc.features.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod source;

pub use client::NwsClient;
pub use config::{FeedConfig, DEFAULT_ALERTS_URL, DEFAULT_POLL_INTERVAL};
pub use error::FeedError;
pub use poller::FeedPoller;
pub use source::{FeedSource, ScriptedFeed};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
