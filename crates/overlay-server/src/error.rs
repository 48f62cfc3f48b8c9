//! Error types for the overlay server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use overlay_engine::EngineError;
use thiserror::Error;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The overlay session is not running.
    #[error("Session error: {0}")]
    Engine(#[from] EngineError),

    /// The request was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Engine(err) => {
                tracing::error!("Session error: {}", err);
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            ServerError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ServerError>;
