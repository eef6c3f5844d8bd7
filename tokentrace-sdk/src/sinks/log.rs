//! Log-stream sink.

use async_trait::async_trait;
use tokentrace_types::UsageRecord;
use tracing::{error, info};

use crate::ExportSink;

/// Channel name used when none is configured.
pub const DEFAULT_CHANNEL: &str = "tokentrace";

/// `tracing` target every usage event is emitted under.
pub const LOG_TARGET: &str = "tokentrace::usage";

/// Emits one `INFO` event per record whose message is the JSON record.
///
/// Events carry the configured channel name in a `channel` field so several
/// sinks can share one subscriber and still be told apart. Where the events
/// end up is decided by whichever `tracing` subscriber the application
/// installed.
#[derive(Debug, Clone)]
pub struct LogSink {
    channel: String,
}

impl LogSink {
    /// Create a sink logging on the given channel.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }
}

#[async_trait]
impl ExportSink for LogSink {
    async fn export(&self, record: &UsageRecord) {
        match serde_json::to_string(record) {
            Ok(json) => info!(target: LOG_TARGET, channel = %self.channel, "{}", json),
            Err(e) => error!(
                error = %e,
                channel = %self.channel,
                "failed to serialize token usage record"
            ),
        }
    }
}
