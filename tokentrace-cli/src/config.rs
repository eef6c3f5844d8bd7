//! Export configuration.
//!
//! Configuration comes from an optional TOML file layered under
//! `TOKENTRACE__*` environment variables:
//!
//! ```toml
//! [sink]
//! kind = "file"
//! path = "usage.jsonl"
//! ```
//!
//! ```bash
//! TOKENTRACE__SINK__KIND=nats TOKENTRACE__SINK__TOPIC=token-usage tokentrace replay usage.jsonl
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tokentrace_adapters::DEFAULT_COLLECTION;
use tokentrace_sdk::sinks::DEFAULT_CHANNEL;
use tokentrace_sdk::{JsonlFileSink, LogSink, SyncExporter, UsageExporter};

/// Prefix of the environment variables read by [`ExportConfig::load`].
pub const ENV_PREFIX: &str = "TOKENTRACE";

const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// Top-level export configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Which sink usage records are exported to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    Log {
        #[serde(default = "default_channel")]
        channel: String,
    },
    File {
        path: PathBuf,
    },
    Firestore {
        project_id: String,
        #[serde(default = "default_collection")]
        collection: String,
        /// Overrides both the production endpoint and `FIRESTORE_EMULATOR_HOST`.
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        bearer_token: Option<String>,
    },
    /// Google Cloud Pub/Sub; `topic` is the topic id within `project_id`.
    #[serde(rename = "pubsub")]
    PubSub {
        project_id: String,
        topic: String,
        /// Overrides both the production endpoint and `PUBSUB_EMULATOR_HOST`.
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        bearer_token: Option<String>,
    },
    Nats {
        #[serde(default = "default_nats_url")]
        url: String,
        topic: String,
        #[serde(default)]
        credentials_file: Option<String>,
    },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Log {
            channel: default_channel(),
        }
    }
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_nats_url() -> String {
    DEFAULT_NATS_URL.to_string()
}

impl ExportConfig {
    /// Load from `path` (if given) with environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("failed to read export configuration")?;

        Self::from_config(config)
    }

    /// Parse a TOML document, ignoring the environment.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("failed to parse export configuration")?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self> {
        config
            .try_deserialize()
            .context("invalid export configuration")
    }
}

/// Build the background exporter described by `config`.
///
/// Exports run on the global export runtime. Remote sinks are only available
/// when the binary was built with the matching feature.
pub async fn build_exporter(config: &ExportConfig) -> Result<Arc<dyn UsageExporter>> {
    match &config.sink {
        SinkConfig::Log { channel } => {
            Ok(Arc::new(SyncExporter::new(LogSink::new(channel.clone()))?))
        }
        SinkConfig::File { path } => Ok(Arc::new(SyncExporter::new(JsonlFileSink::new(path))?)),
        SinkConfig::Firestore {
            project_id,
            collection,
            endpoint,
            bearer_token,
        } => firestore_exporter(project_id, collection, endpoint.as_deref(), bearer_token.as_deref()),
        SinkConfig::PubSub {
            project_id,
            topic,
            endpoint,
            bearer_token,
        } => pubsub_exporter(project_id, topic, endpoint.as_deref(), bearer_token.as_deref()),
        SinkConfig::Nats {
            url,
            topic,
            credentials_file,
        } => nats_exporter(url, topic, credentials_file.as_deref()).await,
    }
}

#[cfg(feature = "firestore")]
fn firestore_exporter(
    project_id: &str,
    collection: &str,
    endpoint: Option<&str>,
    bearer_token: Option<&str>,
) -> Result<Arc<dyn UsageExporter>> {
    use tokentrace_adapters::firestore::FirestoreStore;
    use tokentrace_adapters::DocumentStoreSink;

    let mut builder = FirestoreStore::builder().project_id(project_id);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(token) = bearer_token {
        builder = builder.bearer_token(token);
    }
    let store = builder.build().context("failed to configure Firestore")?;

    Ok(Arc::new(SyncExporter::new(DocumentStoreSink::with_collection(
        store, collection,
    ))?))
}

#[cfg(not(feature = "firestore"))]
fn firestore_exporter(
    _project_id: &str,
    _collection: &str,
    _endpoint: Option<&str>,
    _bearer_token: Option<&str>,
) -> Result<Arc<dyn UsageExporter>> {
    anyhow::bail!("the firestore sink requires tokentrace to be built with the `firestore` feature")
}

#[cfg(feature = "pubsub")]
fn pubsub_exporter(
    project_id: &str,
    topic: &str,
    endpoint: Option<&str>,
    bearer_token: Option<&str>,
) -> Result<Arc<dyn UsageExporter>> {
    use tokentrace_adapters::google_pubsub::GooglePubSubPublisher;
    use tokentrace_adapters::PubSubSink;

    let mut builder = GooglePubSubPublisher::builder().project_id(project_id);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(token) = bearer_token {
        builder = builder.bearer_token(token);
    }
    let publisher = builder.build().context("failed to configure Pub/Sub")?;

    Ok(Arc::new(SyncExporter::new(PubSubSink::new(publisher, topic))?))
}

#[cfg(not(feature = "pubsub"))]
fn pubsub_exporter(
    _project_id: &str,
    _topic: &str,
    _endpoint: Option<&str>,
    _bearer_token: Option<&str>,
) -> Result<Arc<dyn UsageExporter>> {
    anyhow::bail!("the pubsub sink requires tokentrace to be built with the `pubsub` feature")
}

#[cfg(feature = "nats")]
async fn nats_exporter(
    url: &str,
    topic: &str,
    credentials_file: Option<&str>,
) -> Result<Arc<dyn UsageExporter>> {
    use tokentrace_adapters::nats::NatsPublisher;
    use tokentrace_adapters::PubSubSink;

    let mut builder = NatsPublisher::builder().url(url);
    if let Some(creds) = credentials_file {
        builder = builder.credentials_file(creds);
    }
    let publisher = builder
        .build()
        .await
        .with_context(|| format!("failed to connect to NATS at {}", url))?;

    Ok(Arc::new(SyncExporter::new(PubSubSink::new(publisher, topic))?))
}

#[cfg(not(feature = "nats"))]
async fn nats_exporter(
    _url: &str,
    _topic: &str,
    _credentials_file: Option<&str>,
) -> Result<Arc<dyn UsageExporter>> {
    anyhow::bail!("the nats sink requires tokentrace to be built with the `nats` feature")
}
