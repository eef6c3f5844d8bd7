//! Built-in sinks: a structured log stream and an append-only JSONL file.
//!
//! Remote backends (document stores, pub/sub) live in `tokentrace-adapters`.

mod file;
mod log;

pub use file::JsonlFileSink;
pub use log::{LogSink, DEFAULT_CHANNEL, LOG_TARGET};

use crate::SyncExporter;

/// Blocking-context counterpart of [`LogSink`].
pub type SyncLogSink = SyncExporter<LogSink>;

/// Blocking-context counterpart of [`JsonlFileSink`].
pub type SyncJsonlFileSink = SyncExporter<JsonlFileSink>;
