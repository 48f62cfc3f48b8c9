//! Error types for alert-core.

use thiserror::Error;

/// Errors raised at the ingestion and parameter boundaries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The feed document was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A category key that is not one of the recognized keys.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// A color value that is not a 3- or 6-digit hex code.
    #[error("Invalid color '{0}'")]
    InvalidColor(String),
}
