//! Blocking-context facade over asynchronous sinks.

use std::fmt::Debug;
use std::sync::Arc;

use tokentrace_types::UsageRecord;
use tracing::debug;

use crate::runtime::ExportRuntime;
use crate::sink::ExportSink;
use crate::SdkError;

/// Synchronous export entry point.
///
/// `export` returns immediately; the record is delivered later, or not at
/// all if the process exits first.
pub trait UsageExporter: Send + Sync + Debug {
    /// Hand a record off for export without blocking.
    fn export(&self, record: UsageRecord);
}

impl<E> UsageExporter for Arc<E>
where
    E: UsageExporter + ?Sized,
{
    fn export(&self, record: UsageRecord) {
        (**self).export(record)
    }
}

/// Runs an [`ExportSink`] on an [`ExportRuntime`] for callers that are not
/// inside an async context.
///
/// Every `export` call builds one job wrapping `sink.export(&record)` and
/// submits it. Nothing waits for the job: in a short-lived program the
/// process may exit before it runs and the record is silently lost. Call
/// [`ExportRuntime::wait_idle`] before exiting when that matters, or await
/// the sink directly from async code when completion must be observed.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tokentrace_sdk::{
///     AuthMethod, ExportRuntime, LogSink, MethodName, SyncExporter, UsageExporter, UsageRecord,
/// };
///
/// let runtime = ExportRuntime::start().unwrap();
/// let exporter = SyncExporter::with_runtime(LogSink::default(), runtime.clone());
///
/// let record = UsageRecord::builder("gemini-2.5-flash", MethodName::GenerateContent, AuthMethod::ApiKey)
///     .input_tokens(10)
///     .output_tokens(20)
///     .build()
///     .unwrap();
///
/// exporter.export(record);
/// runtime.wait_idle(Duration::from_secs(1));
/// ```
#[derive(Debug)]
pub struct SyncExporter<S> {
    sink: Arc<S>,
    runtime: ExportRuntime,
}

impl<S> SyncExporter<S>
where
    S: ExportSink + 'static,
{
    /// Wrap `sink`, running its exports on the global runtime.
    ///
    /// Starts the global runtime if this is its first use.
    pub fn new(sink: S) -> Result<Self, SdkError> {
        Ok(Self::with_runtime(sink, ExportRuntime::global()?))
    }

    /// Wrap `sink`, running its exports on `runtime`.
    pub fn with_runtime(sink: S, runtime: ExportRuntime) -> Self {
        Self {
            sink: Arc::new(sink),
            runtime,
        }
    }

    /// The wrapped asynchronous sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The runtime exports are submitted to.
    pub fn runtime(&self) -> &ExportRuntime {
        &self.runtime
    }
}

impl<S> UsageExporter for SyncExporter<S>
where
    S: ExportSink + 'static,
{
    fn export(&self, record: UsageRecord) {
        let sink = self.sink.clone();
        debug!(model = %record.model_name, method = %record.method_name, "submitting usage export");
        self.runtime.submit(Box::pin(async move {
            sink.export(&record).await;
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, FailingSink, RecordingSink};
    use std::time::Duration;

    #[test]
    fn exports_from_many_threads_all_arrive() {
        let runtime = ExportRuntime::start().unwrap();
        let sink = RecordingSink::default();
        let exporter = Arc::new(SyncExporter::with_runtime(sink.clone(), runtime.clone()));

        let threads: Vec<_> = (0..16)
            .map(|i| {
                let exporter = exporter.clone();
                std::thread::spawn(move || exporter.export(record("gemini-2.5-flash", i, i)))
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert!(runtime.wait_idle(Duration::from_secs(2)));
        assert_eq!(sink.len(), 16);

        let mut inputs: Vec<u64> = sink.records().iter().map(|r| r.input_tokens).collect();
        inputs.sort_unstable();
        assert_eq!(inputs, (0..16).collect::<Vec<_>>());
        runtime.shutdown();
    }

    #[test]
    fn sequential_exports_are_observed_in_order() {
        let runtime = ExportRuntime::start().unwrap();
        let sink = RecordingSink::default();
        let exporter = SyncExporter::with_runtime(sink.clone(), runtime.clone());

        exporter.export(record("first", 1, 1));
        exporter.export(record("second", 2, 2));

        assert!(runtime.wait_idle(Duration::from_secs(2)));
        let models: Vec<_> = sink.records().into_iter().map(|r| r.model_name).collect();
        assert_eq!(models, vec!["first", "second"]);
        runtime.shutdown();
    }

    #[test]
    fn failing_sink_does_not_reach_the_caller() {
        let runtime = ExportRuntime::start().unwrap();
        let sink = FailingSink::default();
        let exporter = SyncExporter::with_runtime(sink.clone(), runtime.clone());

        exporter.export(record("gemini-2.5-pro", 5, 5));
        exporter.export(record("gemini-2.5-pro", 6, 6));

        assert!(runtime.wait_idle(Duration::from_secs(2)));
        assert_eq!(sink.attempts(), 2);
        assert!(runtime.is_running());
        runtime.shutdown();
    }

    #[tokio::test]
    async fn failing_sink_does_not_reach_async_caller() {
        let sink = FailingSink::default();
        sink.export(&record("gemini-2.5-pro", 1, 1)).await;
        assert_eq!(sink.attempts(), 1);
    }

    #[test]
    fn export_returns_before_job_completes() {
        let runtime = ExportRuntime::start().unwrap();
        let sink = RecordingSink::with_delay(Duration::from_millis(200));
        let exporter = SyncExporter::with_runtime(sink.clone(), runtime.clone());

        let started = std::time::Instant::now();
        exporter.export(record("slow", 1, 1));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(sink.len(), 0);

        assert!(runtime.wait_idle(Duration::from_secs(2)));
        assert_eq!(sink.len(), 1);
        runtime.shutdown();
    }

    #[test]
    fn new_binds_to_global_runtime() {
        let exporter = SyncExporter::new(RecordingSink::default()).unwrap();
        assert!(exporter.runtime().is_running());
    }
}
