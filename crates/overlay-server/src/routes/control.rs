//! Renderer feedback and filter changes.

use alert_core::params::serialize_colors_param;
use alert_core::OverlayParams;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use overlay_engine::ScrollMeasurement;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Accept a `{key, scrollDistance, needsScroll}` report from the renderer.
pub async fn measure_api(
    State(state): State<AppState>,
    Json(measurement): Json<ScrollMeasurement>,
) -> Result<StatusCode> {
    if !measurement.scroll_distance.is_finite() || measurement.scroll_distance < 0.0 {
        return Err(ServerError::BadRequest(
            "scrollDistance must be a non-negative number".to_string(),
        ));
    }
    state.session.measure(measurement).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Request to replace the filter specification.
#[derive(Deserialize)]
pub struct ParamsRequest {
    /// Query string in overlay URL form, e.g. `state=TX&type=TOR`.
    pub query: String,
}

/// The parameters as parsed, after malformed entries were dropped.
#[derive(Debug, Serialize)]
pub struct ParamsResponse {
    pub states: Vec<String>,
    pub offices: Vec<String>,
    pub types: Vec<String>,
    pub zones: Vec<String>,
    pub colors: String,
    pub passive: bool,
}

impl From<&OverlayParams> for ParamsResponse {
    fn from(params: &OverlayParams) -> Self {
        Self {
            states: params.filter.states.clone(),
            offices: params.filter.offices.clone(),
            types: params.filter.types.clone(),
            zones: params.filter.zones.clone(),
            colors: serialize_colors_param(params.palette.overrides()),
            passive: params.passive,
        }
    }
}

/// Replace the filter specification; the display starts over from the top.
pub async fn params_api(
    State(state): State<AppState>,
    Json(req): Json<ParamsRequest>,
) -> Result<Json<ParamsResponse>> {
    let params = OverlayParams::from_query(&req.query);
    let response = ParamsResponse::from(&params);
    info!(query = %req.query, "Applying overlay parameters");
    state.session.set_params(params).await?;
    Ok(Json(response))
}
