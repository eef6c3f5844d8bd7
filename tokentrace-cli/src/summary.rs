//! Per-model usage totals.

use std::collections::BTreeMap;
use std::fmt;

use tokentrace_sdk::UsageRecord;

/// Token and media totals for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelTotals {
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub thinking_tokens: u64,
    pub images_generated: u64,
    pub videos_generated: u64,
}

impl ModelTotals {
    fn add(&mut self, record: &UsageRecord) {
        self.merge(&ModelTotals {
            calls: 1,
            input_tokens: record.input_tokens,
            output_tokens: record.output_tokens,
            thinking_tokens: record.thinking_tokens.unwrap_or(0),
            images_generated: record.images_generated,
            videos_generated: record.videos_generated,
        });
    }

    fn merge(&mut self, other: &ModelTotals) {
        // Counts come from untrusted files.
        self.calls = self.calls.saturating_add(other.calls);
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.thinking_tokens = self.thinking_tokens.saturating_add(other.thinking_tokens);
        self.images_generated = self.images_generated.saturating_add(other.images_generated);
        self.videos_generated = self.videos_generated.saturating_add(other.videos_generated);
    }
}

/// Usage totals keyed by model name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSummary {
    pub models: BTreeMap<String, ModelTotals>,
    pub malformed: usize,
}

impl UsageSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Self {
        let mut summary = UsageSummary::default();
        for record in records {
            summary
                .models
                .entry(record.model_name.clone())
                .or_default()
                .add(record);
        }
        summary
    }

    /// Sum over every model.
    pub fn total(&self) -> ModelTotals {
        let mut total = ModelTotals::default();
        for totals in self.models.values() {
            total.merge(totals);
        }
        total
    }
}

impl fmt::Display for UsageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .models
            .keys()
            .map(String::len)
            .chain(std::iter::once("TOTAL".len()))
            .max()
            .unwrap_or(5);

        writeln!(
            f,
            "{:<width$}  {:>8}  {:>12}  {:>12}  {:>12}  {:>7}  {:>7}",
            "MODEL", "CALLS", "INPUT", "OUTPUT", "THINKING", "IMAGES", "VIDEOS"
        )?;

        let total = self.total();
        let rows = self
            .models
            .iter()
            .map(|(name, totals)| (name.as_str(), totals))
            .chain(std::iter::once(("TOTAL", &total)));
        for (name, t) in rows {
            writeln!(
                f,
                "{:<width$}  {:>8}  {:>12}  {:>12}  {:>12}  {:>7}  {:>7}",
                name,
                t.calls,
                t.input_tokens,
                t.output_tokens,
                t.thinking_tokens,
                t.images_generated,
                t.videos_generated
            )?;
        }

        if self.malformed > 0 {
            writeln!(f, "\n{} malformed line(s) skipped", self.malformed)?;
        }
        Ok(())
    }
}
