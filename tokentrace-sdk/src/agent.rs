//! Usage tracking driven by an agent framework's after-model callback.
//!
//! Agent frameworks call the model themselves, so there is no client to
//! wrap. Instead the framework's callback hands over the agent name, the
//! model name and the response's usage metadata, and
//! [`AgentUsageTracker::after_model_call`] exports a record for it.

use std::collections::HashSet;
use std::sync::Arc;

use tokentrace_types::{AuthMethod, MethodName, UsageRecord};
use tracing::error;

use crate::client::UsageMetadata;
use crate::global::default_exporter;
use crate::UsageExporter;

/// Agent name used when neither an override nor the runner supplies one.
pub const DEFAULT_AGENT_NAME: &str = "adk-agent";

/// Model name used when the callback does not report one.
pub const UNKNOWN_MODEL: &str = "unknown-adk-model";

/// What the framework reported about one model call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelCallback<'a> {
    /// Name of the agent that made the call, if the runner exposes one.
    pub agent_name: Option<&'a str>,
    pub model_name: Option<&'a str>,
    pub usage: Option<UsageMetadata>,
}

/// Exports usage for model calls observed through agent callbacks.
///
/// # Example
///
/// ```rust,no_run
/// use tokentrace_sdk::{AgentUsageTracker, ModelCallback, UsageMetadata};
///
/// let tracker = AgentUsageTracker::builder()
///     .tracked_agents(["planner", "researcher"])
///     .build();
///
/// tracker.after_model_call(&ModelCallback {
///     agent_name: Some("planner"),
///     model_name: Some("gemini-2.5-flash"),
///     usage: Some(UsageMetadata::new(120, 40)),
/// });
/// ```
#[derive(Debug, Default)]
pub struct AgentUsageTracker {
    exporter: Option<Arc<dyn UsageExporter>>,
    agent_name: Option<String>,
    tracked_agents: Option<HashSet<String>>,
}

impl AgentUsageTracker {
    pub fn builder() -> AgentUsageTrackerBuilder {
        AgentUsageTrackerBuilder::default()
    }

    /// Handle one after-model callback.
    ///
    /// Returns whether a record was handed to the exporter. Calls without
    /// usage metadata or with zero tokens in both directions, and calls from
    /// agents outside a non-empty allow-list, are ignored.
    pub fn after_model_call(&self, call: &ModelCallback<'_>) -> bool {
        let Some(usage) = call.usage else {
            return false;
        };
        if usage.prompt_token_count == 0 && usage.candidates_token_count == 0 {
            return false;
        }

        if let Some(tracked) = &self.tracked_agents {
            if !call.agent_name.is_some_and(|name| tracked.contains(name)) {
                return false;
            }
        }

        let agent_name = self
            .agent_name
            .as_deref()
            .or(call.agent_name)
            .unwrap_or(DEFAULT_AGENT_NAME);

        let record = UsageRecord::builder(
            call.model_name.unwrap_or(UNKNOWN_MODEL),
            MethodName::AgentGenerateContent,
            AuthMethod::ApiKey,
        )
        .agent_name(agent_name)
        .input_tokens(usage.prompt_token_count)
        .output_tokens(usage.candidates_token_count)
        .thinking_tokens(usage.thoughts_token_count)
        .cached_content_tokens(usage.cached_content_token_count)
        .build();

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "failed to build agent usage record");
                return false;
            }
        };

        match self.exporter() {
            Some(exporter) => {
                exporter.export(record);
                true
            }
            None => false,
        }
    }

    fn exporter(&self) -> Option<Arc<dyn UsageExporter>> {
        if let Some(exporter) = &self.exporter {
            return Some(exporter.clone());
        }
        match default_exporter() {
            Ok(exporter) => Some(exporter),
            Err(e) => {
                error!(error = %e, "failed to export token usage from agent callback");
                None
            }
        }
    }
}

/// Builder for [`AgentUsageTracker`].
#[derive(Debug, Default)]
pub struct AgentUsageTrackerBuilder {
    exporter: Option<Arc<dyn UsageExporter>>,
    agent_name: Option<String>,
    tracked_agents: Option<HashSet<String>>,
}

impl AgentUsageTrackerBuilder {
    /// Exporter to use instead of the process default.
    pub fn exporter(mut self, exporter: Arc<dyn UsageExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Attribute every record to this name, whatever agent made the call.
    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    /// Only track calls from these agents. An empty list tracks everything.
    pub fn tracked_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let agents: HashSet<String> = agents.into_iter().map(Into::into).collect();
        self.tracked_agents = (!agents.is_empty()).then_some(agents);
        self
    }

    pub fn build(self) -> AgentUsageTracker {
        AgentUsageTracker {
            exporter: self.exporter,
            agent_name: self.agent_name,
            tracked_agents: self.tracked_agents,
        }
    }
}
