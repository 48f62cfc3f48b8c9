//! Application state shared across handlers.

use overlay_engine::SessionHandle;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the running overlay session.
    pub session: SessionHandle,
}

impl AppState {
    /// Create new application state.
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}
