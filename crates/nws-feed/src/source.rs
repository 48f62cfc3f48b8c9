//! The feed source seam.

use std::collections::VecDeque;
use std::sync::Mutex;

use alert_core::FeedDocument;
use async_trait::async_trait;

use crate::error::FeedError;

/// Anything that yields alert feed documents on demand.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current feed document.
    async fn fetch(&self) -> Result<FeedDocument, FeedError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "feed"
    }
}

/// A source that replays scripted responses, then repeats the last one.
///
/// Useful for exercising the polling loop without network access.
#[derive(Default)]
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<Result<FeedDocument, String>>>,
    last: Mutex<Option<FeedDocument>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_document(self, doc: FeedDocument) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Ok(doc));
        }
        self
    }

    /// Queue a failing response.
    pub fn push_error(self, reason: impl Into<String>) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(reason.into()));
        }
        self
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch(&self) -> Result<FeedDocument, FeedError> {
        let next = self
            .responses
            .lock()
            .map_err(|_| FeedError::Config("scripted feed lock poisoned".to_string()))?
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|_| FeedError::Config("scripted feed lock poisoned".to_string()))?;
        match next {
            Some(Ok(doc)) => {
                *last = Some(doc.clone());
                Ok(doc)
            }
            Some(Err(_)) => Err(FeedError::Status { status: 503 }),
            None => Ok(last.clone().unwrap_or_default()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::RawAlertRecord;

    fn doc(event: &str) -> FeedDocument {
        FeedDocument::from_records([RawAlertRecord {
            event: Some(event.to_string()),
            ..Default::default()
        }])
    }

    #[tokio::test]
    async fn test_scripted_feed_replays_then_repeats() {
        let feed = ScriptedFeed::new()
            .push_document(doc("Tornado Warning"))
            .push_error("down");

        let first = feed.fetch().await.unwrap();
        assert_eq!(first.features.len(), 1);
        assert!(matches!(
            feed.fetch().await,
            Err(FeedError::Status { status: 503 })
        ));
        assert_eq!(feed.fetch().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_empty_scripted_feed() {
        let feed = ScriptedFeed::new();
        assert!(feed.fetch().await.unwrap().features.is_empty());
    }
}
