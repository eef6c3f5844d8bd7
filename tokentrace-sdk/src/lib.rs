//! # tokentrace-sdk
//!
//! Non-blocking token usage export for generative-AI clients.
//!
//! Every tracked call produces one [`UsageRecord`] that is handed to an
//! [`ExportSink`]. Async callers await the sink in place; blocking callers go
//! through a [`SyncExporter`], which submits the export to a background
//! [`ExportRuntime`] and returns immediately.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokentrace_sdk::{
//!     AuthContext, ExportRuntime, JsonlFileSink, SyncExporter, UsageTracker,
//! };
//!
//! let runtime = ExportRuntime::global().unwrap();
//! let exporter = SyncExporter::with_runtime(JsonlFileSink::new("usage.jsonl"), runtime.clone());
//!
//! let tracker = UsageTracker::builder()
//!     .agent_name("my-service")
//!     .auth(AuthContext::api_key())
//!     .exporter(Arc::new(exporter))
//!     .build()
//!     .unwrap();
//!
//! // let client = TrackedClient::new(my_gemini_client, tracker);
//! // client.generate_content("gemini-2.5-flash", request)?;
//!
//! // Short-lived programs: let the background exports finish.
//! runtime.wait_idle(Duration::from_secs(2));
//! ```
//!
//! ## Delivery
//!
//! Export is fire-and-forget. Sinks swallow and log their own failures, and
//! a blocking caller never learns whether a record arrived. A process that
//! exits while exports are still queued loses them.

mod agent;
mod client;
mod error;
mod global;
mod runtime;
mod sink;
mod sync;
mod tracked;
mod tracker;

pub mod sinks;

#[cfg(test)]
mod test_support;

pub use agent::{
    AgentUsageTracker, AgentUsageTrackerBuilder, ModelCallback, DEFAULT_AGENT_NAME, UNKNOWN_MODEL,
};
pub use client::{
    AsyncGenerativeModel, ChunkStream, GenerativeModel, ReportsUsage, UsageMetadata, VideoOptions,
};
pub use error::SdkError;
pub use global::{default_exporter, set_default_exporter};
pub use runtime::{ExportJob, ExportRuntime};
pub use sink::ExportSink;
pub use sinks::{JsonlFileSink, LogSink, SyncJsonlFileSink, SyncLogSink};
pub use sync::{SyncExporter, UsageExporter};
pub use tracked::{TrackedClient, TrackedIter, TrackedStream};
pub use tracker::{AuthContext, ClientOptions, UsageTracker, UsageTrackerBuilder};

// Re-export types for convenience
pub use tokentrace_types::{AuthMethod, MethodName, RecordError, UsageRecord, UsageRecordBuilder};
