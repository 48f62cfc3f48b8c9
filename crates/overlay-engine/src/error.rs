//! Error types for overlay-engine.

use thiserror::Error;

/// Errors from the overlay session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session task has stopped.
    #[error("Overlay session closed")]
    SessionClosed,

    /// No matching frame arrived in time.
    #[error("Timed out waiting for a display frame")]
    Timeout,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
