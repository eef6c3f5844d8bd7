//! Publish-subscribe sink.

use std::fmt::Debug;

use async_trait::async_trait;
use tokentrace_sdk::{ExportSink, SyncExporter, UsageRecord};
use tracing::{debug, error};

use crate::error::AdapterError;

/// A message bus that publishes opaque payloads on named topics.
#[async_trait]
pub trait Publisher: Send + Sync + Debug {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), AdapterError>;
}

/// Publishes each record as a JSON message on one topic.
///
/// Backend failures are logged and dropped.
#[derive(Debug)]
pub struct PubSubSink<P> {
    publisher: P,
    topic: String,
}

impl<P: Publisher> PubSubSink<P> {
    pub fn new(publisher: P, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    async fn publish(&self, record: &UsageRecord) -> Result<(), AdapterError> {
        let payload = serde_json::to_vec(record)?;
        self.publisher.publish(&self.topic, payload).await
    }
}

#[async_trait]
impl<P: Publisher> ExportSink for PubSubSink<P> {
    async fn export(&self, record: &UsageRecord) {
        match self.publish(record).await {
            Ok(()) => debug!(topic = %self.topic, "Published usage record"),
            Err(e) => error!(topic = %self.topic, error = %e, "Failed to publish usage record"),
        }
    }
}

/// Background-exporting pub/sub sink.
pub type SyncPubSubSink<P> = SyncExporter<PubSubSink<P>>;
