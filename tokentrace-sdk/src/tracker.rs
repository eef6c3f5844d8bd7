//! Turns observed call results into usage records and routes them to an exporter.

use std::path::Path;
use std::sync::Arc;

use tokentrace_types::{AuthMethod, MethodName, RecordError, UsageRecord};
use tracing::{error, warn};

use crate::client::UsageMetadata;
use crate::global::default_exporter;
use crate::sinks::LogSink;
use crate::{ExportSink, SdkError, UsageExporter};

/// How the wrapped client was configured, as far as authentication goes.
///
/// Mirrors the knobs a Gemini client accepts; only used to derive the
/// [`AuthContext`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub api_key: Option<String>,
    /// Explicit service-account credentials were supplied.
    pub credentials: bool,
    /// The client targets Vertex AI.
    pub vertexai: bool,
    pub project: Option<String>,
    pub location: Option<String>,
}

/// Authentication method plus the Vertex AI project and location stamped on
/// every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub method: AuthMethod,
    pub project_id: Option<String>,
    pub location: Option<String>,
}

impl AuthContext {
    pub fn api_key() -> Self {
        Self {
            method: AuthMethod::ApiKey,
            project_id: None,
            location: None,
        }
    }

    pub fn vertex(
        method: AuthMethod,
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            method,
            project_id: Some(project_id.into()),
            location: Some(location.into()),
        }
    }

    /// Derive the context from client options, falling back to the
    /// `GEMINI_API_KEY` / `GOOGLE_API_KEY` environment variables.
    pub fn detect(options: &ClientOptions) -> Self {
        Self::detect_with(options, |key| std::env::var(key).ok())
    }

    /// Like [`detect`](Self::detect) with an injectable environment lookup.
    ///
    /// Precedence: api key, explicit credentials, Vertex mode, api key in the
    /// environment, application default credentials.
    pub fn detect_with<F>(options: &ClientOptions, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let method = if options.api_key.is_some() {
            AuthMethod::ApiKey
        } else if options.credentials {
            AuthMethod::ServiceAccount
        } else if options.vertexai {
            AuthMethod::Adc
        } else if ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .any(|key| env(key).is_some_and(|v| !v.is_empty()))
        {
            AuthMethod::ApiKey
        } else {
            AuthMethod::Adc
        };

        Self {
            method,
            project_id: options.project.clone(),
            location: options.location.clone(),
        }
    }

    /// Check the context against the record invariant before any call is made.
    pub fn validate(&self) -> Result<(), RecordError> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);
        if self.method.requires_vertex_context() && (blank(&self.project_id) || blank(&self.location)) {
            return Err(RecordError::MissingVertexContext { auth: self.method });
        }
        Ok(())
    }
}

/// Builds records for a client and exports them.
///
/// Blocking callers go through a [`UsageExporter`] (the configured one, or the
/// process default); async callers await an [`ExportSink`] in place (the
/// configured one, or a [`LogSink`]).
#[derive(Debug, Clone)]
pub struct UsageTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug)]
struct TrackerInner {
    agent_name: String,
    session_id: Option<String>,
    user_id: Option<String>,
    auth: AuthContext,
    exporter: Option<Arc<dyn UsageExporter>>,
    sink: Arc<dyn ExportSink>,
}

impl UsageTracker {
    pub fn builder() -> UsageTrackerBuilder {
        UsageTrackerBuilder::default()
    }

    pub fn agent_name(&self) -> &str {
        &self.inner.agent_name
    }

    pub fn auth(&self) -> &AuthContext {
        &self.inner.auth
    }

    /// Build a record for one observed call.
    ///
    /// Returns `None` when there is nothing worth exporting: no tokens in
    /// either direction and no generated media.
    pub fn record(
        &self,
        model: &str,
        method: MethodName,
        usage: Option<UsageMetadata>,
        images_generated: u64,
        videos_generated: u64,
    ) -> Option<UsageRecord> {
        let usage = usage.unwrap_or_default();
        if usage.prompt_token_count == 0
            && usage.candidates_token_count == 0
            && images_generated == 0
            && videos_generated == 0
        {
            return None;
        }

        let inner = &self.inner;
        let mut builder = UsageRecord::builder(model, method, inner.auth.method)
            .agent_name(inner.agent_name.clone())
            .vertex_context(inner.auth.project_id.clone(), inner.auth.location.clone())
            .input_tokens(usage.prompt_token_count)
            .output_tokens(usage.candidates_token_count)
            .thinking_tokens(usage.thoughts_token_count)
            .cached_content_tokens(usage.cached_content_token_count)
            .tool_use_prompt_tokens(usage.tool_use_prompt_token_count)
            .images_generated(images_generated)
            .videos_generated(videos_generated);
        if let Some(session_id) = &inner.session_id {
            builder = builder.session_id(session_id.clone());
        }
        if let Some(user_id) = &inner.user_id {
            builder = builder.user_id(user_id.clone());
        }

        match builder.build() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, model, "skipping usage record");
                None
            }
        }
    }

    /// Hand a record to the blocking exporter without waiting.
    pub fn export_blocking(&self, record: UsageRecord) {
        if let Some(exporter) = &self.inner.exporter {
            exporter.export(record);
            return;
        }
        match default_exporter() {
            Ok(exporter) => exporter.export(record),
            Err(e) => error!(error = %e, "no exporter available, dropping usage record"),
        }
    }

    /// Export a record through the async sink, awaiting the attempt.
    pub async fn export_async(&self, record: UsageRecord) {
        self.inner.sink.export(&record).await;
    }

    pub(crate) fn capture_blocking(
        &self,
        model: &str,
        method: MethodName,
        usage: Option<UsageMetadata>,
        images_generated: u64,
        videos_generated: u64,
    ) {
        if let Some(record) = self.record(model, method, usage, images_generated, videos_generated) {
            self.export_blocking(record);
        }
    }

    pub(crate) async fn capture_async(
        &self,
        model: &str,
        method: MethodName,
        usage: Option<UsageMetadata>,
        images_generated: u64,
        videos_generated: u64,
    ) {
        if let Some(record) = self.record(model, method, usage, images_generated, videos_generated) {
            self.export_async(record).await;
        }
    }

    pub(crate) fn sink(&self) -> Arc<dyn ExportSink> {
        self.inner.sink.clone()
    }
}

/// Builder for [`UsageTracker`].
#[derive(Debug, Default)]
pub struct UsageTrackerBuilder {
    agent_name: Option<String>,
    session_id: Option<String>,
    user_id: Option<String>,
    auth: Option<AuthContext>,
    exporter: Option<Arc<dyn UsageExporter>>,
    sink: Option<Arc<dyn ExportSink>>,
}

impl UsageTrackerBuilder {
    /// Agent name stamped on records (default: the executable's file name).
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

    /// Authentication context (default: detected from the environment).
    pub fn auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Exporter for blocking calls (default: the process default exporter).
    pub fn exporter(mut self, exporter: Arc<dyn UsageExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Sink awaited by async calls (default: a [`LogSink`]).
    pub fn sink(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the tracker, rejecting Vertex AI auth without project and location.
    pub fn build(self) -> Result<UsageTracker, SdkError> {
        let auth = self
            .auth
            .unwrap_or_else(|| AuthContext::detect(&ClientOptions::default()));
        auth.validate()?;

        Ok(UsageTracker {
            inner: Arc::new(TrackerInner {
                agent_name: self.agent_name.unwrap_or_else(default_agent_name),
                session_id: self.session_id,
                user_id: self.user_id,
                auth,
                exporter: self.exporter,
                sink: self.sink.unwrap_or_else(|| Arc::new(LogSink::default())),
            }),
        })
    }
}

fn default_agent_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tokentrace".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSink;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn detect_prefers_explicit_options() {
        let options = ClientOptions {
            api_key: Some("key".into()),
            credentials: true,
            vertexai: true,
            ..Default::default()
        };
        assert_eq!(AuthContext::detect_with(&options, no_env).method, AuthMethod::ApiKey);

        let options = ClientOptions {
            credentials: true,
            vertexai: true,
            project: Some("p".into()),
            location: Some("us-central1".into()),
            ..Default::default()
        };
        let auth = AuthContext::detect_with(&options, no_env);
        assert_eq!(auth.method, AuthMethod::ServiceAccount);
        assert_eq!(auth.project_id.as_deref(), Some("p"));

        let options = ClientOptions {
            vertexai: true,
            ..Default::default()
        };
        assert_eq!(AuthContext::detect_with(&options, no_env).method, AuthMethod::Adc);
    }

    #[test]
    fn detect_falls_back_to_environment() {
        let options = ClientOptions::default();
        let env = |key: &str| (key == "GOOGLE_API_KEY").then(|| "k".to_string());
        assert_eq!(AuthContext::detect_with(&options, env).method, AuthMethod::ApiKey);
        assert_eq!(AuthContext::detect_with(&options, no_env).method, AuthMethod::Adc);
    }

    #[test]
    fn build_rejects_vertex_auth_without_context() {
        let err = UsageTracker::builder()
            .auth(AuthContext {
                method: AuthMethod::Adc,
                project_id: Some("p".into()),
                location: None,
            })
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SdkError::Record(RecordError::MissingVertexContext { auth: AuthMethod::Adc })
        ));
    }

    #[test]
    fn record_fills_in_tracker_context() {
        let tracker = UsageTracker::builder()
            .agent_name("planner")
            .session_id("s-1")
            .auth(AuthContext::vertex(AuthMethod::ServiceAccount, "proj", "us-central1"))
            .sink(Arc::new(RecordingSink::default()))
            .build()
            .unwrap();

        let usage = UsageMetadata {
            prompt_token_count: 12,
            candidates_token_count: 34,
            thoughts_token_count: Some(56),
            ..Default::default()
        };
        let record = tracker
            .record("gemini-2.5-pro", MethodName::GenerateContent, Some(usage), 0, 0)
            .unwrap();

        assert_eq!(record.agent_name.as_deref(), Some("planner"));
        assert_eq!(record.session_id.as_deref(), Some("s-1"));
        assert_eq!(record.user_id, None);
        assert_eq!(record.authentication_method, AuthMethod::ServiceAccount);
        assert_eq!(record.project_id.as_deref(), Some("proj"));
        assert_eq!(record.input_tokens, 12);
        assert_eq!(record.output_tokens, 34);
        assert_eq!(record.thinking_tokens, Some(56));
    }

    #[test]
    fn empty_usage_produces_no_record() {
        let tracker = UsageTracker::builder()
            .auth(AuthContext::api_key())
            .build()
            .unwrap();

        assert!(tracker
            .record("m", MethodName::GenerateContent, None, 0, 0)
            .is_none());
        assert!(tracker
            .record("m", MethodName::GenerateContent, Some(UsageMetadata::default()), 0, 0)
            .is_none());
        assert!(tracker
            .record("imagen-4", MethodName::GenerateImages, None, 1, 0)
            .is_some());
        assert!(tracker
            .record("veo-3", MethodName::GenerateVideos, None, 0, 1)
            .is_some());
    }

    #[test]
    fn default_agent_name_is_not_empty() {
        assert!(!default_agent_name().is_empty());
    }
}
