//! Google Cloud Pub/Sub backend for [`PubSubSink`](crate::PubSubSink).
//!
//! Messages are published through the Pub/Sub REST API into a topic of one
//! project; the sink's topic name is the topic id. The publisher itself needs
//! the `pubsub` feature.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tokentrace_adapters::google_pubsub::GooglePubSubPublisher;
//! use tokentrace_adapters::PubSubSink;
//! use tokentrace_sdk::SyncExporter;
//!
//! let publisher = GooglePubSubPublisher::builder()
//!     .project_id("my-project")
//!     .bearer_token(token)
//!     .build()?;
//! let exporter = SyncExporter::new(PubSubSink::new(publisher, "token-usage"))?;
//! ```

#[cfg(feature = "pubsub")]
mod client;

#[cfg(feature = "pubsub")]
pub use client::{GooglePubSubPublisher, GooglePubSubPublisherBuilder};

/// Environment variable pointing the client at a local emulator.
pub const EMULATOR_HOST_ENV: &str = "PUBSUB_EMULATOR_HOST";

/// Production REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com";
