//! Document-store sink.
//!
//! Each record becomes one document in a named collection.

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use tokentrace_sdk::{ExportSink, SyncExporter, UsageRecord};
use tracing::{debug, error};

use crate::error::AdapterError;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "token_usage_records";

/// A store that accepts one JSON document per insert.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Insert `document` into `collection`.
    async fn insert(&self, collection: &str, document: Value) -> Result<(), AdapterError>;
}

/// Writes each record as a document.
///
/// Backend failures are logged and dropped.
#[derive(Debug)]
pub struct DocumentStoreSink<D> {
    store: D,
    collection: String,
}

impl<D: DocumentStore> DocumentStoreSink<D> {
    /// Sink writing to [`DEFAULT_COLLECTION`].
    pub fn new(store: D) -> Self {
        Self::with_collection(store, DEFAULT_COLLECTION)
    }

    pub fn with_collection(store: D, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    async fn insert(&self, record: &UsageRecord) -> Result<(), AdapterError> {
        let document = serde_json::to_value(record)?;
        self.store.insert(&self.collection, document).await
    }
}

#[async_trait]
impl<D: DocumentStore> ExportSink for DocumentStoreSink<D> {
    async fn export(&self, record: &UsageRecord) {
        match self.insert(record).await {
            Ok(()) => debug!(
                collection = %self.collection,
                model = %record.model_name,
                "Stored usage record"
            ),
            Err(e) => error!(
                collection = %self.collection,
                error = %e,
                "Failed to store usage record"
            ),
        }
    }
}

/// Background-exporting document-store sink.
pub type SyncDocumentStoreSink<D> = SyncExporter<DocumentStoreSink<D>>;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokentrace_sdk::{AuthMethod, ExportRuntime, MethodName, UsageExporter};

    use super::*;

    #[derive(Debug, Default)]
    struct MemoryStore {
        documents: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn insert(&self, collection: &str, document: Value) -> Result<(), AdapterError> {
            self.documents.lock().push((collection.to_string(), document));
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct UnreachableStore {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for UnreachableStore {
        async fn insert(&self, _collection: &str, _document: Value) -> Result<(), AdapterError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AdapterError::Connection("connection refused".to_string()))
        }
    }

    fn record(model: &str) -> UsageRecord {
        UsageRecord::builder(model, MethodName::GenerateContent, AuthMethod::ServiceAccount)
            .vertex_context(Some("proj".to_string()), Some("us-central1".to_string()))
            .input_tokens(12)
            .output_tokens(30)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_inserts_one_document_per_record() {
        let sink = DocumentStoreSink::new(MemoryStore::default());
        sink.export(&record("gemini-2.5-flash")).await;
        sink.export(&record("gemini-2.5-pro")).await;

        let documents = sink.store().documents.lock();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].0, DEFAULT_COLLECTION);
        assert_eq!(documents[0].1["model_name"], "gemini-2.5-flash");
        assert_eq!(documents[0].1["authentication_method"], "service_account");
        assert_eq!(documents[0].1["project_id"], "proj");
        assert_eq!(documents[1].1["input_tokens"], 12);
    }

    #[tokio::test]
    async fn test_custom_collection() {
        let sink = DocumentStoreSink::with_collection(MemoryStore::default(), "billing");
        sink.export(&record("m")).await;

        assert_eq!(sink.collection(), "billing");
        assert_eq!(sink.store().documents.lock()[0].0, "billing");
    }

    #[tokio::test]
    async fn test_backend_failure_is_swallowed() {
        let sink = DocumentStoreSink::new(UnreachableStore::default());
        sink.export(&record("m")).await;
        sink.export(&record("m")).await;

        assert_eq!(sink.store().attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_background_export_reaches_store() {
        let runtime = ExportRuntime::start().unwrap();
        let exporter: SyncDocumentStoreSink<MemoryStore> = SyncExporter::with_runtime(
            DocumentStoreSink::new(MemoryStore::default()),
            runtime.clone(),
        );

        for i in 0..5 {
            exporter.export(record(&format!("model-{i}")));
        }
        assert!(runtime.wait_idle(Duration::from_secs(5)));

        let documents = exporter.sink().store().documents.lock();
        let models: Vec<_> = documents
            .iter()
            .map(|(_, doc)| doc["model_name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(models, ["model-0", "model-1", "model-2", "model-3", "model-4"]);
        drop(documents);
        runtime.shutdown();
    }
}
