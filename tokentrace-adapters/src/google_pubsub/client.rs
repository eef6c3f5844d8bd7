use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::{DEFAULT_ENDPOINT, EMULATOR_HOST_ENV};
use crate::endpoint::resolve_endpoint;
use crate::{AdapterError, Publisher};

/// Publishes to Google Cloud Pub/Sub topics of one project over REST.
#[derive(Debug, Clone)]
pub struct GooglePubSubPublisher {
    client: Client,
    endpoint: String,
    project_id: String,
    bearer_token: Option<String>,
}

impl GooglePubSubPublisher {
    /// Create a new builder for configuring the publisher.
    pub fn builder() -> GooglePubSubPublisherBuilder {
        GooglePubSubPublisherBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn publish_url(&self, topic: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.endpoint, self.project_id, topic
        )
    }
}

/// Body of a `topics.publish` request carrying one message.
fn publish_body(payload: &[u8]) -> Value {
    json!({ "messages": [{ "data": STANDARD.encode(payload) }] })
}

#[async_trait]
impl Publisher for GooglePubSubPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), AdapterError> {
        let mut request = self
            .client
            .post(self.publish_url(topic))
            .json(&publish_body(&payload));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdapterError::Auth(format!(
                "Pub/Sub returned status {}",
                status
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Builder for GooglePubSubPublisher.
#[derive(Debug, Default)]
pub struct GooglePubSubPublisherBuilder {
    project_id: Option<String>,
    endpoint: Option<String>,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
}

impl GooglePubSubPublisherBuilder {
    /// Set the Google Cloud project owning the topics (required).
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Override the REST endpoint.
    ///
    /// Without this, `PUBSUB_EMULATOR_HOST` is used when set, else the
    /// production endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// OAuth access token sent as `Authorization: Bearer`.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the publisher.
    pub fn build(self) -> Result<GooglePubSubPublisher, AdapterError> {
        let project_id = self
            .project_id
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AdapterError::Auth("a Pub/Sub project id is required".to_string()))?;

        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(GooglePubSubPublisher {
            client,
            endpoint: resolve_endpoint(
                self.endpoint,
                std::env::var(EMULATOR_HOST_ENV).ok(),
                DEFAULT_ENDPOINT,
            ),
            project_id,
            bearer_token: self.bearer_token,
        })
    }
}
