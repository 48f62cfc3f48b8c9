//! Periodic feed polling.

use std::sync::Arc;
use std::time::Duration;

use alert_core::FeedDocument;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::source::FeedSource;

/// Polls a [`FeedSource`] on a fixed interval.
///
/// Only successful fetches are forwarded. Failures are logged and the
/// poller carries on with the next tick, so consumers keep their last good
/// state.
pub struct FeedPoller {
    source: Arc<dyn FeedSource>,
    poll_interval: Duration,
}

impl FeedPoller {
    /// Create a poller with the default 30 second interval.
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self {
            source,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the poll interval. A zero interval falls back to the default.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!(default = ?DEFAULT_POLL_INTERVAL, "Zero poll interval, using default");
            self.poll_interval = DEFAULT_POLL_INTERVAL;
        } else {
            self.poll_interval = interval;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Fetch once, logging and swallowing failures.
    pub async fn poll_once(&self) -> Option<FeedDocument> {
        match self.source.fetch().await {
            Ok(doc) => {
                debug!(
                    source = self.source.name(),
                    features = doc.features.len(),
                    "Feed fetch succeeded"
                );
                Some(doc)
            }
            Err(e) => {
                error!(source = self.source.name(), "Failed to fetch alerts: {}", e);
                None
            }
        }
    }

    /// Poll forever, sending each successful document to `tx`.
    ///
    /// The first fetch happens immediately. Returns when the receiver is dropped.
    pub async fn run(self, tx: mpsc::Sender<FeedDocument>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            source = self.source.name(),
            poll_interval = ?self.poll_interval,
            "Starting feed poller"
        );

        loop {
            ticker.tick().await;

            if let Some(doc) = self.poll_once().await {
                if tx.send(doc).await.is_err() {
                    warn!("Channel closed, stopping feed poller");
                    return;
                }
            }
        }
    }

    /// Spawn the poller and return the document channel and task handle.
    pub fn spawn(self) -> (mpsc::Receiver<FeedDocument>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScriptedFeed;
    use alert_core::RawAlertRecord;

    fn doc(headline: &str) -> FeedDocument {
        FeedDocument::from_records([RawAlertRecord {
            event: Some("Tornado Warning".to_string()),
            headline: Some(headline.to_string()),
            ..Default::default()
        }])
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_skipped() {
        let feed = ScriptedFeed::new()
            .push_document(doc("first"))
            .push_error("503")
            .push_document(doc("second"));
        let poller = FeedPoller::new(Arc::new(feed)).with_poll_interval(Duration::from_secs(30));
        let (mut rx, handle) = poller.spawn();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.features[0].properties.headline.as_deref(), Some("first"));

        // The failed tick produces nothing; the next success arrives a tick later.
        let second = rx.recv().await.unwrap();
        assert_eq!(second.features[0].properties.headline.as_deref(), Some("second"));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_uses_default() {
        let feed = ScriptedFeed::new()
            .push_document(doc("first"))
            .push_document(doc("second"));
        let poller = FeedPoller::new(Arc::new(feed)).with_poll_interval(Duration::ZERO);
        assert_eq!(poller.poll_interval(), DEFAULT_POLL_INTERVAL);

        let (mut rx, handle) = poller.spawn();
        assert!(rx.recv().await.is_some());
        let started = tokio::time::Instant::now();
        assert!(rx.recv().await.is_some());
        assert_eq!(started.elapsed(), DEFAULT_POLL_INTERVAL);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_when_receiver_dropped() {
        let poller = FeedPoller::new(Arc::new(ScriptedFeed::new().push_document(doc("only"))))
            .with_poll_interval(Duration::from_secs(1));
        let (rx, handle) = poller.spawn();
        drop(rx);
        handle.await.unwrap();
    }
}
