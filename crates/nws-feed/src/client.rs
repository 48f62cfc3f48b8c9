//! HTTP client for the weather.gov alerts endpoint.

use alert_core::FeedDocument;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::source::FeedSource;

/// Client for the active alerts feed.
#[derive(Clone)]
pub struct NwsClient {
    http: Client,
    config: FeedConfig,
}

impl NwsClient {
    /// Create a client from configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Fetch and parse the feed once.
    pub async fn fetch_alerts(&self) -> Result<FeedDocument, FeedError> {
        debug!("Fetching alerts from {}", self.config.url);

        let response = self
            .http
            .get(&self.config.url)
            .header(ACCEPT, "application/geo+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let doc = FeedDocument::from_slice(&body)?;
        debug!("Fetched {} features", doc.features.len());
        Ok(doc)
    }
}

#[async_trait]
impl FeedSource for NwsClient {
    async fn fetch(&self) -> Result<FeedDocument, FeedError> {
        self.fetch_alerts().await
    }

    fn name(&self) -> &str {
        "weather.gov"
    }
}
