//! Error types for the SDK.

use thiserror::Error;

use tokentrace_types::RecordError;

/// Errors surfaced to callers of the SDK.
///
/// Export failures are never reported here: sinks log and swallow them.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The background export runtime or its thread could not be started.
    #[error("failed to start export runtime: {0}")]
    RuntimeStart(#[source] std::io::Error),

    /// A usage record could not be constructed.
    #[error(transparent)]
    Record(#[from] RecordError),
}
