//! # tokentrace-types
//!
//! Core types for generative-AI token usage tracking. This crate defines the
//! record that every tokentrace sink consumes, independent of how the record
//! is transported or stored.
//!
//! ## Features
//!
//! - `serde`: JSON (and any other serde format) wire form for [`UsageRecord`]
//!
//! ## Example
//!
//! ```rust
//! use tokentrace_types::{AuthMethod, MethodName, UsageRecord};
//!
//! let record = UsageRecord::builder("gemini-2.5-flash", MethodName::GenerateContent, AuthMethod::ApiKey)
//!     .input_tokens(10)
//!     .output_tokens(20)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(record.total_tokens(), 30);
//! assert_eq!(record.images_generated, 0);
//! ```
//!
//! ## Vertex AI context
//!
//! Records authenticated through a service account or application default
//! credentials must carry both a project id and a location:
//!
//! ```rust
//! use tokentrace_types::{AuthMethod, MethodName, RecordError, UsageRecord};
//!
//! let err = UsageRecord::builder("gemini-2.5-pro", MethodName::GenerateContent, AuthMethod::ServiceAccount)
//!     .input_tokens(1)
//!     .output_tokens(1)
//!     .project_id("my-project")
//!     .build()
//!     .unwrap_err();
//!
//! assert!(matches!(err, RecordError::MissingVertexContext { .. }));
//! ```

mod auth;
mod error;
mod method;
mod record;

pub use auth::*;
pub use error::*;
pub use method::*;
pub use record::*;
