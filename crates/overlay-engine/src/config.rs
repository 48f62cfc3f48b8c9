//! Configuration for display timing and the session loop.

use std::env;
use std::time::Duration;

use crate::error::EngineError;

/// Exit/enter animation window between alerts.
pub const TRANSITION_WINDOW: Duration = Duration::from_millis(300);

/// Pause before and after scrolling long area text.
pub const BUFFER_TIME: Duration = Duration::from_millis(2000);

/// Slowest acceptable scroll speed, in pixels per second.
pub const MIN_READING_SPEED: f64 = 80.0;

const STATIC_DISPLAY_MIN: Duration = Duration::from_millis(5000);
const STATIC_DISPLAY_MAX: Duration = Duration::from_millis(10000);

/// Timing parameters for the display controller.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// Length of the transition window.
    pub transition: Duration,
    /// Delay before scrolling starts, and the hold after it ends.
    pub buffer: Duration,
    /// Display time for text that fits without scrolling.
    pub static_display: Duration,
    /// Scroll speed in pixels per second.
    pub reading_speed: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            transition: TRANSITION_WINDOW,
            buffer: BUFFER_TIME,
            static_display: STATIC_DISPLAY_MAX,
            reading_speed: MIN_READING_SPEED,
        }
    }
}

impl TimingConfig {
    /// Set the display time for non-scrolling entries, clamped to 5-10 seconds.
    pub fn with_static_display(mut self, duration: Duration) -> Self {
        self.static_display = duration.clamp(STATIC_DISPLAY_MIN, STATIC_DISPLAY_MAX);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OVERLAY_STATIC_DISPLAY_MS` | `10000` (clamped to 5000-10000) |
    /// | `OVERLAY_BUFFER_MS` | `2000` |
    /// | `OVERLAY_TRANSITION_MS` | `300` |
    /// | `OVERLAY_READING_SPEED_PX` | `80` |
    pub fn from_env() -> Result<Self, EngineError> {
        let defaults = Self::default();
        let static_display =
            millis_var("OVERLAY_STATIC_DISPLAY_MS")?.unwrap_or(defaults.static_display);
        let buffer = millis_var("OVERLAY_BUFFER_MS")?.unwrap_or(defaults.buffer);
        let transition = millis_var("OVERLAY_TRANSITION_MS")?.unwrap_or(defaults.transition);
        let reading_speed = match env::var("OVERLAY_READING_SPEED_PX") {
            Ok(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|speed| *speed > 0.0)
                .ok_or_else(|| {
                    EngineError::Config("OVERLAY_READING_SPEED_PX must be a positive number".into())
                })?,
            Err(_) => defaults.reading_speed,
        };

        Ok(Self {
            transition,
            buffer,
            reading_speed,
            ..defaults
        }
        .with_static_display(static_display))
    }
}

fn millis_var(name: &str) -> Result<Option<Duration>, EngineError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| EngineError::Config(format!("{} must be a number of milliseconds", name))),
        Err(_) => Ok(None),
    }
}

/// Configuration for an overlay session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub timing: TimingConfig,
    /// Frame interval while area text is scrolling.
    pub frame_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl SessionConfig {
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, EngineError> {
        Ok(Self::default().with_timing(TimingConfig::from_env()?))
    }
}
