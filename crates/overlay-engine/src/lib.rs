//! Presentation queue and display timing for the Overwarn overlay.
//!
//! - [`queue`] - the rotating queue, with seen tracking across refreshes
//! - [`timing`] - the Idle/Showing/Transitioning state machine and scroll timing
//! - [`presenter`] - what a renderer receives and reports back
//! - [`session`] - one view's state, driven from a single task
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use alert_core::OverlayParams;
//! use nws_feed::{FeedConfig, FeedPoller, NwsClient};
//! use overlay_engine::{OverlaySession, SessionConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NwsClient::new(FeedConfig::default())?;
//! let (docs, _poller) = FeedPoller::new(Arc::new(client)).spawn();
//!
//! let params = OverlayParams::from_query("state=TX");
//! let session = OverlaySession::new(SessionConfig::default(), params);
//! let (handle, _task) = session.spawn(docs);
//! println!("{:?}", handle.frame().alert);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod presenter;
pub mod queue;
pub mod session;
pub mod timing;

pub use config::{SessionConfig, TimingConfig};
pub use error::EngineError;
pub use presenter::{DisplayFrame, FrameAlert, Presenter, ScrollMeasurement, TextMetricsPresenter};
pub use queue::{PresentationQueue, QueueEntry, QueueManager};
pub use session::{OverlaySession, SessionCommand, SessionHandle};
pub use timing::{DisplayController, DisplayEvent, DisplayPhase, Durations};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
