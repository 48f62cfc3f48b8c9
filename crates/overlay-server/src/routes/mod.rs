//! Route handlers for the overlay server.

pub mod control;
pub mod display;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        .route("/api/version", get(health::version))
        // Display state for the browser source
        .route("/api/display", get(display::display_api))
        // Renderer feedback and filter changes
        .route("/api/measure", post(control::measure_api))
        .route("/api/params", post(control::params_api))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use alert_core::{FeedDocument, OverlayParams, RawAlertRecord};
    use overlay_engine::{OverlaySession, SessionConfig};
    use tokio::sync::mpsc;

    use crate::state::AppState;

    pub fn tornado(headline: &str, area: &str) -> RawAlertRecord {
        RawAlertRecord {
            event: Some("Tornado Warning".to_string()),
            headline: Some(headline.to_string()),
            area_desc: Some(area.to_string()),
            ends: Some("2030-01-01T00:00:00Z".to_string()),
            ..Default::default()
        }
    }

    /// A running session that has ingested `records`.
    pub async fn state_with(
        records: Vec<RawAlertRecord>,
    ) -> (AppState, mpsc::Sender<FeedDocument>) {
        let (tx, rx) = mpsc::channel(4);
        let (handle, _task) =
            OverlaySession::new(SessionConfig::default(), OverlayParams::default()).spawn(rx);
        let expect_alert = !records.is_empty();
        tx.send(FeedDocument::from_records(records)).await.unwrap();
        if expect_alert {
            handle
                .wait_for(Duration::from_secs(1), |f| f.alert.is_some())
                .await
                .unwrap();
        }
        (AppState::new(handle), tx)
    }
}
