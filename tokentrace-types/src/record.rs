//! UsageRecord - the token and media usage of one instrumented call.

use chrono::{DateTime, Utc};

use crate::{AuthMethod, MethodName, RecordError};

/// Token and media usage observed for a single generative-AI call.
///
/// Records are immutable values: they are built once, handed to exactly one
/// sink, and never mutated afterwards. Construction goes through
/// [`UsageRecord::builder`], which enforces that Vertex AI authenticated
/// records carry a project id and a location.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawUsageRecord"))]
pub struct UsageRecord {
    /// When the record was created.
    pub timestamp: DateTime<Utc>,
    pub agent_name: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    /// Model the call was addressed to, e.g. `gemini-2.5-flash`.
    pub model_name: String,
    pub method_name: MethodName,
    pub authentication_method: AuthMethod,
    pub project_id: Option<String>,
    pub location: Option<String>,
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Candidate (response) tokens.
    pub output_tokens: u64,
    pub thinking_tokens: Option<u64>,
    pub cached_content_tokens: Option<u64>,
    pub tool_use_prompt_tokens: Option<u64>,
    pub images_generated: u64,
    pub videos_generated: u64,
}

impl UsageRecord {
    /// Start building a record for the given model, method and auth method.
    pub fn builder(
        model_name: impl Into<String>,
        method_name: MethodName,
        authentication_method: AuthMethod,
    ) -> UsageRecordBuilder {
        UsageRecordBuilder::new(model_name.into(), method_name, authentication_method)
    }

    /// Input plus output tokens.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// True when the record carries neither tokens nor generated media.
    ///
    /// Sinks never filter on this; it is up to the instrumentation layer to
    /// skip empty records.
    pub fn is_empty(&self) -> bool {
        self.input_tokens == 0
            && self.output_tokens == 0
            && self.images_generated == 0
            && self.videos_generated == 0
    }

    fn validate(&self) -> Result<(), RecordError> {
        if self.authentication_method.requires_vertex_context()
            && (is_blank(&self.project_id) || is_blank(&self.location))
        {
            return Err(RecordError::MissingVertexContext {
                auth: self.authentication_method,
            });
        }
        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Builder for [`UsageRecord`].
#[derive(Debug, Clone)]
pub struct UsageRecordBuilder {
    timestamp: Option<DateTime<Utc>>,
    agent_name: Option<String>,
    session_id: Option<String>,
    user_id: Option<String>,
    model_name: String,
    method_name: MethodName,
    authentication_method: AuthMethod,
    project_id: Option<String>,
    location: Option<String>,
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    thinking_tokens: Option<u64>,
    cached_content_tokens: Option<u64>,
    tool_use_prompt_tokens: Option<u64>,
    images_generated: u64,
    videos_generated: u64,
}

impl UsageRecordBuilder {
    fn new(model_name: String, method_name: MethodName, authentication_method: AuthMethod) -> Self {
        Self {
            timestamp: None,
            agent_name: None,
            session_id: None,
            user_id: None,
            model_name,
            method_name,
            authentication_method,
            project_id: None,
            location: None,
            input_tokens: None,
            output_tokens: None,
            thinking_tokens: None,
            cached_content_tokens: None,
            tool_use_prompt_tokens: None,
            images_generated: 0,
            videos_generated: 0,
        }
    }

    /// Override the creation timestamp (defaults to now at `build()`).
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn project_id(mut self, project: impl Into<String>) -> Self {
        self.project_id = Some(project.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set project and location from optional values, e.g. a client's auth context.
    pub fn vertex_context(mut self, project: Option<String>, location: Option<String>) -> Self {
        self.project_id = project;
        self.location = location;
        self
    }

    pub fn input_tokens(mut self, count: u64) -> Self {
        self.input_tokens = Some(count);
        self
    }

    pub fn output_tokens(mut self, count: u64) -> Self {
        self.output_tokens = Some(count);
        self
    }

    pub fn thinking_tokens(mut self, count: Option<u64>) -> Self {
        self.thinking_tokens = count;
        self
    }

    pub fn cached_content_tokens(mut self, count: Option<u64>) -> Self {
        self.cached_content_tokens = count;
        self
    }

    pub fn tool_use_prompt_tokens(mut self, count: Option<u64>) -> Self {
        self.tool_use_prompt_tokens = count;
        self
    }

    pub fn images_generated(mut self, count: u64) -> Self {
        self.images_generated = count;
        self
    }

    pub fn videos_generated(mut self, count: u64) -> Self {
        self.videos_generated = count;
        self
    }

    /// Build the record, enforcing the Vertex AI context invariant.
    pub fn build(self) -> Result<UsageRecord, RecordError> {
        let record = UsageRecord {
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            agent_name: self.agent_name,
            session_id: self.session_id,
            user_id: self.user_id,
            model_name: self.model_name,
            method_name: self.method_name,
            authentication_method: self.authentication_method,
            project_id: self.project_id,
            location: self.location,
            input_tokens: self
                .input_tokens
                .ok_or(RecordError::MissingField("input_tokens"))?,
            output_tokens: self
                .output_tokens
                .ok_or(RecordError::MissingField("output_tokens"))?,
            thinking_tokens: self.thinking_tokens,
            cached_content_tokens: self.cached_content_tokens,
            tool_use_prompt_tokens: self.tool_use_prompt_tokens,
            images_generated: self.images_generated,
            videos_generated: self.videos_generated,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Unvalidated wire form; deserialization goes through `TryFrom` so a parsed
/// record obeys the same invariant as a built one.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawUsageRecord {
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    agent_name: Option<String>,
    session_id: Option<String>,
    user_id: Option<String>,
    model_name: String,
    method_name: MethodName,
    authentication_method: AuthMethod,
    project_id: Option<String>,
    location: Option<String>,
    input_tokens: u64,
    output_tokens: u64,
    thinking_tokens: Option<u64>,
    cached_content_tokens: Option<u64>,
    tool_use_prompt_tokens: Option<u64>,
    #[serde(default)]
    images_generated: u64,
    #[serde(default)]
    videos_generated: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawUsageRecord> for UsageRecord {
    type Error = RecordError;

    fn try_from(raw: RawUsageRecord) -> Result<Self, Self::Error> {
        let record = UsageRecord {
            timestamp: raw.timestamp,
            agent_name: raw.agent_name,
            session_id: raw.session_id,
            user_id: raw.user_id,
            model_name: raw.model_name,
            method_name: raw.method_name,
            authentication_method: raw.authentication_method,
            project_id: raw.project_id,
            location: raw.location,
            input_tokens: raw.input_tokens,
            output_tokens: raw.output_tokens,
            thinking_tokens: raw.thinking_tokens,
            cached_content_tokens: raw.cached_content_tokens,
            tool_use_prompt_tokens: raw.tool_use_prompt_tokens,
            images_generated: raw.images_generated,
            videos_generated: raw.videos_generated,
        };
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_key_builder() -> UsageRecordBuilder {
        UsageRecord::builder("gemini-2.5-pro", MethodName::GenerateContent, AuthMethod::ApiKey)
            .input_tokens(10)
            .output_tokens(20)
    }

    #[test]
    fn defaults_are_applied() {
        let before = Utc::now();
        let record = api_key_builder().build().unwrap();
        let after = Utc::now();

        assert!(record.timestamp >= before && record.timestamp <= after);
        assert_eq!(record.images_generated, 0);
        assert_eq!(record.videos_generated, 0);
        assert_eq!(record.thinking_tokens, None);
        assert_eq!(record.agent_name, None);
        assert_eq!(record.project_id, None);
    }

    #[test]
    fn api_key_needs_no_vertex_context() {
        assert!(api_key_builder().build().is_ok());
        assert!(api_key_builder().project_id("p").build().is_ok());
        assert!(api_key_builder().location("us-central1").build().is_ok());
        assert!(api_key_builder()
            .project_id("p")
            .location("us-central1")
            .build()
            .is_ok());
    }

    #[test]
    fn vertex_auth_requires_project_and_location() {
        for auth in [AuthMethod::ServiceAccount, AuthMethod::Adc] {
            let base = UsageRecord::builder("gemini-2.5-pro", MethodName::GenerateContent, auth)
                .input_tokens(1)
                .output_tokens(1);

            let expected = RecordError::MissingVertexContext { auth };
            assert_eq!(base.clone().build().unwrap_err(), expected);
            assert_eq!(base.clone().project_id("p").build().unwrap_err(), expected);
            assert_eq!(
                base.clone().location("europe-west4").build().unwrap_err(),
                expected
            );
            assert_eq!(
                base.clone()
                    .project_id("")
                    .location("europe-west4")
                    .build()
                    .unwrap_err(),
                expected
            );

            let record = base.project_id("p").location("europe-west4").build().unwrap();
            assert_eq!(record.project_id.as_deref(), Some("p"));
            assert_eq!(record.location.as_deref(), Some("europe-west4"));
        }
    }

    #[test]
    fn token_counts_are_required() {
        let err = UsageRecord::builder("m", MethodName::GenerateContent, AuthMethod::ApiKey)
            .output_tokens(1)
            .build()
            .unwrap_err();
        assert_eq!(err, RecordError::MissingField("input_tokens"));

        let err = UsageRecord::builder("m", MethodName::GenerateContent, AuthMethod::ApiKey)
            .input_tokens(1)
            .build()
            .unwrap_err();
        assert_eq!(err, RecordError::MissingField("output_tokens"));
    }

    #[test]
    fn empty_and_totals() {
        let empty = UsageRecord::builder("m", MethodName::GenerateContent, AuthMethod::ApiKey)
            .input_tokens(0)
            .output_tokens(0)
            .build()
            .unwrap();
        assert!(empty.is_empty());

        let images = UsageRecord::builder("imagen-4", MethodName::GenerateImages, AuthMethod::ApiKey)
            .input_tokens(0)
            .output_tokens(0)
            .images_generated(2)
            .build()
            .unwrap();
        assert!(!images.is_empty());

        assert_eq!(api_key_builder().build().unwrap().total_tokens(), 30);
    }

    #[cfg(feature = "serde")]
    mod wire {
        use super::*;

        #[test]
        fn json_round_trip_preserves_all_fields() {
            let record = UsageRecord::builder(
                "gemini-2.5-flash",
                MethodName::GenerateContentStream,
                AuthMethod::Adc,
            )
            .agent_name("planner")
            .session_id("s-1")
            .user_id("u-1")
            .project_id("proj")
            .location("us-central1")
            .input_tokens(120)
            .output_tokens(48)
            .thinking_tokens(Some(300))
            .cached_content_tokens(Some(64))
            .tool_use_prompt_tokens(Some(7))
            .build()
            .unwrap();

            let json = serde_json::to_string(&record).unwrap();
            let parsed: UsageRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, record);
        }

        #[test]
        fn wire_names_match_the_json_schema() {
            let record = api_key_builder()
                .timestamp("2025-06-01T12:00:00Z".parse().unwrap())
                .build()
                .unwrap();
            let value = serde_json::to_value(&record).unwrap();

            assert_eq!(value["method_name"], "generate_content");
            assert_eq!(value["authentication_method"], "api_key");
            assert_eq!(value["timestamp"], "2025-06-01T12:00:00Z");
            assert!(value["thinking_tokens"].is_null());
            assert_eq!(value["images_generated"], 0);
        }

        #[test]
        fn minimal_json_gets_defaults() {
            let json = r#"{
                "model_name": "gemini-2.5-flash",
                "method_name": "generate_content",
                "authentication_method": "api_key",
                "input_tokens": 10,
                "output_tokens": 20
            }"#;
            let record: UsageRecord = serde_json::from_str(json).unwrap();
            assert_eq!(record.input_tokens, 10);
            assert_eq!(record.videos_generated, 0);
            assert_eq!(record.session_id, None);
        }

        #[test]
        fn parsing_enforces_vertex_context() {
            let json = r#"{
                "model_name": "gemini-2.5-flash",
                "method_name": "generate_content",
                "authentication_method": "service_account",
                "input_tokens": 10,
                "output_tokens": 20
            }"#;
            let err = serde_json::from_str::<UsageRecord>(json).unwrap_err();
            assert!(err.to_string().contains("project_id and location"));
        }

        #[test]
        fn agent_method_has_dotted_wire_name() {
            let record = UsageRecord::builder(
                "unknown-adk-model",
                MethodName::AgentGenerateContent,
                AuthMethod::ApiKey,
            )
            .input_tokens(1)
            .output_tokens(1)
            .build()
            .unwrap();
            let value = serde_json::to_value(&record).unwrap();
            assert_eq!(value["method_name"], "adk.generate_content");
        }
    }
}
