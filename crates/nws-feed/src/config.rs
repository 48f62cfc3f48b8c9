//! Configuration for the alert feed.

use std::env;
use std::time::Duration;

use crate::error::FeedError;

/// Default active-alerts endpoint.
pub const DEFAULT_ALERTS_URL: &str = "https://api.weather.gov/alerts/active";

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for polling the alert feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Feed URL.
    pub url: String,
    /// User-Agent header. weather.gov rejects requests without one.
    pub user_agent: String,
    /// Time between fetches.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ALERTS_URL.to_string(),
            user_agent: format!("overwarn/{}", env!("CARGO_PKG_VERSION")),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl FeedConfig {
    /// Create a config for the given feed URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `NWS_ALERTS_URL` | `https://api.weather.gov/alerts/active` |
    /// | `NWS_USER_AGENT` | `overwarn/<version>` |
    /// | `NWS_POLL_INTERVAL_SECS` | `30` |
    /// | `NWS_REQUEST_TIMEOUT_SECS` | `15` |
    pub fn from_env() -> Result<Self, FeedError> {
        let defaults = Self::default();

        let url = env::var("NWS_ALERTS_URL").unwrap_or(defaults.url);
        let user_agent = env::var("NWS_USER_AGENT").unwrap_or(defaults.user_agent);
        let poll_interval = secs_var("NWS_POLL_INTERVAL_SECS")?.unwrap_or(defaults.poll_interval);
        let request_timeout =
            secs_var("NWS_REQUEST_TIMEOUT_SECS")?.unwrap_or(defaults.request_timeout);

        if poll_interval.is_zero() {
            return Err(FeedError::Config(
                "NWS_POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            url,
            user_agent,
            poll_interval,
            request_timeout,
        })
    }
}

fn secs_var(name: &str) -> Result<Option<Duration>, FeedError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| FeedError::Config(format!("{} must be a number of seconds", name))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.url, DEFAULT_ALERTS_URL);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("overwarn/"));
    }

    #[test]
    fn test_builder() {
        let config = FeedConfig::new("http://localhost:9000/alerts")
            .with_poll_interval(Duration::from_secs(10))
            .with_user_agent("test-agent");
        assert_eq!(config.url, "http://localhost:9000/alerts");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.user_agent, "test-agent");
    }
}
