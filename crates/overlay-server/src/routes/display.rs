//! The current display frame.

use axum::extract::State;
use axum::Json;
use overlay_engine::DisplayFrame;

use crate::state::AppState;

/// Latest frame published by the session.
pub async fn display_api(State(state): State<AppState>) -> Json<DisplayFrame> {
    Json(state.session.frame())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{state_with, tornado};
    use overlay_engine::DisplayPhase;

    #[tokio::test(start_paused = true)]
    async fn test_display_shows_current_alert() {
        let (state, _feed) = state_with(vec![tornado("a", "Smith, TX")]).await;
        let Json(frame) = display_api(State(state)).await;
        assert_eq!(frame.phase, DisplayPhase::Showing);
        assert_eq!(frame.alert.unwrap().label, "TORNADO WARNING");
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_idle_without_alerts() {
        let (state, _feed) = state_with(Vec::new()).await;
        let Json(frame) = display_api(State(state)).await;
        assert!(frame.alert.is_none());
        assert_eq!(frame.queue_len, 0);
    }
}
