//! The contract between the engine and whatever renders the overlay.
//!
//! A renderer receives a [`DisplayFrame`] and reports back a
//! [`ScrollMeasurement`] for the alert it drew. A browser does this over HTTP;
//! [`TextMetricsPresenter`] does it in-process by estimating text width.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Overflow of the area bar text, reported after a render.
///
/// `key` is the displayed alert's key string, so a report about an alert that
/// is no longer current can be recognized and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMeasurement {
    pub key: String,
    /// Pixels the text must travel to reveal its end.
    pub scroll_distance: f64,
    pub needs_scroll: bool,
}

impl ScrollMeasurement {
    /// Build from the text's scroll width and the container's client width.
    pub fn from_widths(
        key: impl Into<String>,
        scroll_width: f64,
        client_width: f64,
        horizontal_padding: f64,
    ) -> Self {
        let visible = (client_width - horizontal_padding).max(0.0);
        let overflow = (scroll_width - visible).max(0.0);
        Self {
            key: key.into(),
            scroll_distance: overflow,
            needs_scroll: overflow > 0.0,
        }
    }
}

/// Display fields for the alert on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAlert {
    pub key: String,
    pub category: String,
    pub label: String,
    pub color: String,
    pub light_color: String,
    pub headline: String,
    pub area: String,
    pub area_text: String,
    pub states: String,
    pub expires_in: Option<String>,
    pub expires_at: Option<String>,
    pub ugc: Vec<String>,
    pub is_new: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFrame {
    pub phase: crate::timing::DisplayPhase,
    pub is_transitioning: bool,
    pub alert: Option<FrameAlert>,
    pub index: usize,
    pub queue_len: usize,
    pub scroll_offset: f64,
    pub scroll_duration_ms: u64,
    pub display_duration_ms: u64,
    /// Bumped once per newly observed alert.
    pub signal_seq: u64,
    pub play_sound: bool,
    /// Classified alerts per category key, before filtering.
    pub counts: BTreeMap<String, usize>,
    pub version: String,
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self {
            phase: crate::timing::DisplayPhase::Idle,
            is_transitioning: false,
            alert: None,
            index: 0,
            queue_len: 0,
            scroll_offset: 0.0,
            scroll_duration_ms: 0,
            display_duration_ms: 0,
            signal_seq: 0,
            play_sound: false,
            counts: BTreeMap::new(),
            version: crate::version().to_string(),
        }
    }
}

/// Renders frames and reports text overflow.
pub trait Presenter: Send {
    /// Render a frame whose alert or area text changed.
    ///
    /// Returns the overflow measurement for the rendered alert, if any.
    fn render(&mut self, frame: &DisplayFrame) -> Option<ScrollMeasurement>;
}

/// Headless presenter estimating width from character count.
#[derive(Debug, Clone)]
pub struct TextMetricsPresenter {
    glyph_width: f64,
    container_width: f64,
    horizontal_padding: f64,
}

impl Default for TextMetricsPresenter {
    fn default() -> Self {
        Self {
            glyph_width: 12.0,
            container_width: 1280.0,
            horizontal_padding: 32.0,
        }
    }
}

impl TextMetricsPresenter {
    pub fn new(glyph_width: f64, container_width: f64) -> Self {
        Self {
            glyph_width,
            container_width,
            ..Self::default()
        }
    }

    pub fn with_padding(mut self, horizontal_padding: f64) -> Self {
        self.horizontal_padding = horizontal_padding;
        self
    }

    /// Estimated rendered width of a line of text.
    pub fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.glyph_width
    }
}

impl Presenter for TextMetricsPresenter {
    fn render(&mut self, frame: &DisplayFrame) -> Option<ScrollMeasurement> {
        let alert = frame.alert.as_ref()?;
        Some(ScrollMeasurement::from_widths(
            alert.key.clone(),
            self.text_width(&alert.area_text),
            self.container_width,
            self.horizontal_padding,
        ))
    }
}
