//! Errors raised while constructing records.

use thiserror::Error;

use crate::AuthMethod;

/// Errors that can occur when building a [`UsageRecord`](crate::UsageRecord).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Vertex AI authentication without a project id or location.
    #[error("project_id and location are required for {auth} authentication")]
    MissingVertexContext {
        /// The authentication method that requires the context.
        auth: AuthMethod,
    },

    /// A required field was never set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A string could not be parsed into one of the closed enumerations.
    #[error("unknown {kind}: {value}")]
    UnknownVariant {
        /// Which enumeration was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}
