//! # tokentrace-adapters
//!
//! Remote sinks for tokentrace usage records.
//!
//! Each sink is written against a small backend trait so the transport can be
//! swapped (or faked in tests):
//!
//! - [`DocumentStoreSink`] over a [`DocumentStore`] - one document per record
//! - [`PubSubSink`] over a [`Publisher`] - one message per record
//!
//! ## Backends
//!
//! - **Firestore** (`firestore` feature) - REST API, honours `FIRESTORE_EMULATOR_HOST`
//! - **Google Cloud Pub/Sub** (`pubsub` feature) - REST API, honours `PUBSUB_EMULATOR_HOST`
//! - **NATS** (`nats` feature) - publishes on a subject named after the topic
//!
//! ## Quick Start (Firestore)
//!
//! ```rust,ignore
//! use tokentrace_adapters::firestore::FirestoreStore;
//! use tokentrace_adapters::DocumentStoreSink;
//! use tokentrace_sdk::{SyncExporter, UsageExporter};
//!
//! let store = FirestoreStore::builder().project_id("my-project").build()?;
//! let exporter = SyncExporter::new(DocumentStoreSink::new(store))?;
//! exporter.export(record);
//! ```

pub mod document;
mod endpoint;
pub mod error;
pub mod firestore;
pub mod google_pubsub;
pub mod pubsub;

#[cfg(feature = "nats")]
pub mod nats;

pub use document::{DocumentStore, DocumentStoreSink, SyncDocumentStoreSink, DEFAULT_COLLECTION};
pub use error::AdapterError;
pub use pubsub::{PubSubSink, Publisher, SyncPubSubSink};

// Re-export types for convenience
pub use tokentrace_sdk::{ExportSink, UsageRecord};
