//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokentrace_types::{AuthMethod, MethodName, UsageRecord};
use tracing::error;

use crate::ExportSink;

pub(crate) fn record(model: &str, input: u64, output: u64) -> UsageRecord {
    UsageRecord::builder(model, MethodName::GenerateContent, AuthMethod::ApiKey)
        .input_tokens(input)
        .output_tokens(output)
        .build()
        .unwrap()
}

/// Keeps every exported record.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSink {
    records: Arc<Mutex<Vec<UsageRecord>>>,
    delay: Option<Duration>,
}

impl RecordingSink {
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn records(&self) -> Vec<UsageRecord> {
        self.records.lock().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl ExportSink for RecordingSink {
    async fn export(&self, record: &UsageRecord) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.records.lock().push(record.clone());
    }
}

/// Simulates a backend that always errors, swallowing the failure the way
/// real sinks do.
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingSink {
    attempts: Arc<AtomicUsize>,
}

impl FailingSink {
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExportSink for FailingSink {
    async fn export(&self, record: &UsageRecord) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "simulated network error",
        ));
        if let Err(e) = result {
            error!(error = %e, model = %record.model_name, "failed to export usage record");
        }
    }
}
