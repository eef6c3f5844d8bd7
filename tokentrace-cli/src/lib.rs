//! # tokentrace-cli
//!
//! Library behind the `tokentrace` binary: export configuration, reading
//! JSONL usage files, and per-model summaries.
//!
//! ```bash
//! # Totals per model from a file written by the JSONL sink
//! tokentrace summarize usage.jsonl
//!
//! # Send the records of a file to the configured sink
//! tokentrace replay usage.jsonl --config tokentrace.toml
//! ```

pub mod config;
pub mod summary;
pub mod usage_file;

pub use config::{build_exporter, ExportConfig, SinkConfig};
pub use summary::{ModelTotals, UsageSummary};
pub use usage_file::UsageFile;
