//! The contract every usage export backend implements.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokentrace_types::UsageRecord;

/// An asynchronous destination for usage records.
///
/// `export` never fails from the caller's point of view: implementations
/// catch their own backend errors (network, auth, quota, serialization) and
/// report them through `tracing`. Returning normally only means the attempt
/// was made.
///
/// Callers already running inside an async context await `export` directly
/// and get completion (but still not delivery) confirmation. Blocking callers
/// wrap the sink in a [`SyncExporter`](crate::SyncExporter).
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use tokentrace_sdk::{ExportSink, UsageRecord};
///
/// #[derive(Debug)]
/// struct StdoutSink;
///
/// #[async_trait]
/// impl ExportSink for StdoutSink {
///     async fn export(&self, record: &UsageRecord) {
///         println!("{} used {} tokens", record.model_name, record.total_tokens());
///     }
/// }
/// ```
#[async_trait]
pub trait ExportSink: Send + Sync + Debug {
    /// Export one record. Must not panic on backend failure.
    async fn export(&self, record: &UsageRecord);
}

#[async_trait]
impl<S> ExportSink for Arc<S>
where
    S: ExportSink + ?Sized,
{
    async fn export(&self, record: &UsageRecord) {
        (**self).export(record).await
    }
}

#[async_trait]
impl<S> ExportSink for Box<S>
where
    S: ExportSink + ?Sized,
{
    async fn export(&self, record: &UsageRecord) {
        (**self).export(record).await
    }
}
