//! Firestore backend for [`DocumentStoreSink`](crate::DocumentStoreSink).
//!
//! Documents are written through the Firestore REST API, so the only
//! transport dependency is an HTTP client. The encoding from plain JSON into
//! Firestore's typed value format lives here and is always compiled; the
//! HTTP store itself needs the `firestore` feature.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tokentrace_adapters::firestore::FirestoreStore;
//! use tokentrace_adapters::DocumentStoreSink;
//! use tokentrace_sdk::SyncExporter;
//!
//! let store = FirestoreStore::builder()
//!     .project_id("my-project")
//!     .bearer_token(token)
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//! let exporter = SyncExporter::new(DocumentStoreSink::new(store))?;
//! ```

#[cfg(feature = "firestore")]
mod client;

#[cfg(feature = "firestore")]
pub use client::{FirestoreStore, FirestoreStoreBuilder};

use serde_json::{json, Map, Value};

/// Environment variable pointing the client at a local emulator.
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

/// Production REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Field whose RFC 3339 string is stored as a native timestamp.
const TIMESTAMP_FIELD: &str = "timestamp";

/// Wrap a JSON object as the body of a `createDocument` request.
pub fn encode_document(document: &Map<String, Value>) -> Value {
    json!({ "fields": encode_fields(document) })
}

fn encode_fields(fields: &Map<String, Value>) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| {
            let typed = match value {
                Value::String(s) if key == TIMESTAMP_FIELD => json!({ "timestampValue": s }),
                other => encode_value(other),
            };
            (key.clone(), typed)
        })
        .collect();
    Value::Object(encoded)
}

/// Convert one JSON value into Firestore's typed `Value` representation.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        // Firestore carries int64 as a decimal string.
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n.as_f64() }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}
