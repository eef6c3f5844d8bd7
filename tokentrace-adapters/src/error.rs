//! Error types for adapters.

use thiserror::Error;

/// Errors a backend can report. Sinks log these; they never reach the
/// code that produced the record.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The record could not be encoded for the backend.
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The backend answered but refused the write.
    #[error("Backend rejected write ({status}): {body}")]
    Rejected {
        /// Status code reported by the backend.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

#[cfg(any(feature = "firestore", feature = "pubsub"))]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}
