//! Authentication methods a generative-AI client can be configured with.

use std::fmt;
use std::str::FromStr;

use crate::RecordError;

/// How the instrumented client authenticated.
///
/// `ServiceAccount` and `Adc` route through Vertex AI and therefore require a
/// project id and a location on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AuthMethod {
    /// Gemini Developer API key.
    ApiKey,
    /// Explicit service-account credentials.
    ServiceAccount,
    /// Application default credentials.
    Adc,
}

impl AuthMethod {
    /// Wire name of this method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ApiKey => "api_key",
            AuthMethod::ServiceAccount => "service_account",
            AuthMethod::Adc => "adc",
        }
    }

    /// Whether records using this method must carry a project and location.
    pub const fn requires_vertex_context(&self) -> bool {
        matches!(self, AuthMethod::ServiceAccount | AuthMethod::Adc)
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api_key" => Ok(AuthMethod::ApiKey),
            "service_account" => Ok(AuthMethod::ServiceAccount),
            "adc" => Ok(AuthMethod::Adc),
            other => Err(RecordError::UnknownVariant {
                kind: "authentication method",
                value: other.to_string(),
            }),
        }
    }
}
