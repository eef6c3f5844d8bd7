//! NATS backend for [`PubSubSink`](crate::PubSubSink).
//!
//! Each record is published as a core NATS message whose subject is the
//! sink's topic.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tokentrace_adapters::nats::NatsPublisher;
//! use tokentrace_adapters::PubSubSink;
//! use tokentrace_sdk::SyncExporter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let publisher = NatsPublisher::builder()
//!         .url("nats://localhost:4222")
//!         .build()
//!         .await?;
//!
//!     let exporter = SyncExporter::new(PubSubSink::new(publisher, "token-usage"))?;
//!     # let _ = exporter;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use crate::{AdapterError, Publisher};

const DEFAULT_URL: &str = "nats://localhost:4222";

/// Publishes payloads through a NATS client connection.
pub struct NatsPublisher {
    client: async_nats::Client,
    url: String,
}

impl NatsPublisher {
    /// Create a new builder for configuring the publisher.
    pub fn builder() -> NatsPublisherBuilder {
        NatsPublisherBuilder::default()
    }

    /// Server the publisher connected to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Publisher for NatsPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), AdapterError> {
        self.client
            .publish(topic.to_string(), payload.into())
            .await
            .map_err(|e| AdapterError::Connection(e.to_string()))?;
        // Publishing only buffers; flush so a failure surfaces here.
        self.client
            .flush()
            .await
            .map_err(|e| AdapterError::Connection(e.to_string()))
    }
}

impl std::fmt::Debug for NatsPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsPublisher").field("url", &self.url).finish()
    }
}

/// Builder for NatsPublisher.
#[derive(Debug, Default)]
pub struct NatsPublisherBuilder {
    url: Option<String>,
    credentials: Option<String>,
}

impl NatsPublisherBuilder {
    /// Set the NATS server URL (default: "nats://localhost:4222").
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the path to a credentials file for authentication.
    pub fn credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials = Some(path.into());
        self
    }

    /// Connect and build the publisher.
    pub async fn build(self) -> Result<NatsPublisher, AdapterError> {
        let url = self.url.unwrap_or_else(|| DEFAULT_URL.to_string());

        let client = if let Some(creds) = self.credentials {
            async_nats::ConnectOptions::new()
                .credentials_file(&creds)
                .await
                .map_err(|e| AdapterError::Auth(e.to_string()))?
                .connect(&url)
                .await
                .map_err(|e| AdapterError::Connection(e.to_string()))?
        } else {
            async_nats::connect(&url)
                .await
                .map_err(|e| AdapterError::Connection(e.to_string()))?
        };

        Ok(NatsPublisher { client, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = NatsPublisher::builder();
        assert!(builder.url.is_none());
        assert!(builder.credentials.is_none());
    }

    #[test]
    fn test_builder_with_credentials() {
        let builder = NatsPublisher::builder()
            .url("nats://bus:4222")
            .credentials_file("/etc/nats/usage.creds");

        assert_eq!(builder.url.as_deref(), Some("nats://bus:4222"));
        assert_eq!(builder.credentials.as_deref(), Some("/etc/nats/usage.creds"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let result = NatsPublisher::builder()
            .url("nats://127.0.0.1:1")
            .build()
            .await;

        assert!(matches!(result, Err(AdapterError::Connection(_))));
    }
}
