//! Append-only JSON Lines file sink.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokentrace_types::UsageRecord;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::error;

use crate::ExportSink;

/// Appends each record as one JSON line to a file.
///
/// The file is opened in append mode (and created if missing) for every
/// export. Writes are serialized through a fair async mutex, so records
/// submitted from one thread land in submission order even though each
/// write suspends on file I/O.
#[derive(Debug)]
pub struct JsonlFileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &UsageRecord) -> io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ExportSink for JsonlFileSink {
    async fn export(&self, record: &UsageRecord) {
        if let Err(e) = self.append(record).await {
            error!(
                error = %e,
                path = %self.path.display(),
                "failed to export token usage record to JSONL file"
            );
        }
    }
}
