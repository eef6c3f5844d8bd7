//! The closed set of tracked client operations.

use std::fmt;
use std::str::FromStr;

use crate::RecordError;

/// The client operation that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MethodName {
    #[cfg_attr(feature = "serde", serde(rename = "generate_content"))]
    GenerateContent,
    #[cfg_attr(feature = "serde", serde(rename = "generate_content_stream"))]
    GenerateContentStream,
    #[cfg_attr(feature = "serde", serde(rename = "generate_images"))]
    GenerateImages,
    #[cfg_attr(feature = "serde", serde(rename = "generate_videos"))]
    GenerateVideos,
    /// A model call observed through an agent framework callback rather than
    /// through the wrapped client.
    #[cfg_attr(feature = "serde", serde(rename = "adk.generate_content"))]
    AgentGenerateContent,
}

impl MethodName {
    /// Wire name of this method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MethodName::GenerateContent => "generate_content",
            MethodName::GenerateContentStream => "generate_content_stream",
            MethodName::GenerateImages => "generate_images",
            MethodName::GenerateVideos => "generate_videos",
            MethodName::AgentGenerateContent => "adk.generate_content",
        }
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodName {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate_content" => Ok(MethodName::GenerateContent),
            "generate_content_stream" => Ok(MethodName::GenerateContentStream),
            "generate_images" => Ok(MethodName::GenerateImages),
            "generate_videos" => Ok(MethodName::GenerateVideos),
            "adk.generate_content" => Ok(MethodName::AgentGenerateContent),
            other => Err(RecordError::UnknownVariant {
                kind: "method name",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_parse() {
        let all = [
            MethodName::GenerateContent,
            MethodName::GenerateContentStream,
            MethodName::GenerateImages,
            MethodName::GenerateVideos,
            MethodName::AgentGenerateContent,
        ];
        for method in all {
            assert_eq!(method.to_string().parse::<MethodName>().unwrap(), method);
        }
    }

    #[test]
    fn rejects_unknown() {
        let err = "count_tokens".parse::<MethodName>().unwrap_err();
        assert_eq!(err.to_string(), "unknown method name: count_tokens");
    }
}
