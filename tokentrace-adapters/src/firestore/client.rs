use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::{encode_document, DEFAULT_ENDPOINT, EMULATOR_HOST_ENV};
use crate::endpoint::resolve_endpoint;
use crate::{AdapterError, DocumentStore};

const DEFAULT_DATABASE: &str = "(default)";

/// Firestore document store speaking the REST API.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Client,
    endpoint: String,
    project_id: String,
    database: String,
    bearer_token: Option<String>,
}

impl FirestoreStore {
    /// Create a new builder for configuring the store.
    pub fn builder() -> FirestoreStoreBuilder {
        FirestoreStoreBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents/{}",
            self.endpoint, self.project_id, self.database, collection
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<(), AdapterError> {
        let Value::Object(fields) = document else {
            return Err(AdapterError::Http(
                "Firestore documents must be JSON objects".to_string(),
            ));
        };

        let mut request = self
            .client
            .post(self.collection_url(collection))
            .json(&encode_document(&fields));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdapterError::Auth(format!(
                "Firestore returned status {}",
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

/// Builder for FirestoreStore.
#[derive(Debug, Default)]
pub struct FirestoreStoreBuilder {
    project_id: Option<String>,
    endpoint: Option<String>,
    database: Option<String>,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
}

impl FirestoreStoreBuilder {
    /// Set the Google Cloud project (required).
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Override the REST endpoint.
    ///
    /// Without this, `FIRESTORE_EMULATOR_HOST` is used when set, else the
    /// production endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the database id (default: "(default)").
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
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

    /// Build the store.
    pub fn build(self) -> Result<FirestoreStore, AdapterError> {
        let project_id = self
            .project_id
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AdapterError::Auth("a Firestore project id is required".to_string()))?;

        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(FirestoreStore {
            client,
            endpoint: resolve_endpoint(
                self.endpoint,
                std::env::var(EMULATOR_HOST_ENV).ok(),
                DEFAULT_ENDPOINT,
            ),
            project_id,
            database: self.database.unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            bearer_token: self.bearer_token,
        })
    }
}
