//! Reading JSONL usage files written by the file sink.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tokentrace_sdk::UsageRecord;
use tracing::debug;

/// Records parsed from a usage file.
#[derive(Debug, Default)]
pub struct UsageFile {
    pub records: Vec<UsageRecord>,
    /// Non-blank lines that were not a valid record.
    pub malformed: usize,
}

impl UsageFile {
    /// Load usage records from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Parse one record per line. Bad lines are counted, not fatal.
    pub fn parse(content: &str) -> Self {
        let mut file = UsageFile::default();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<UsageRecord>(line) {
                Ok(record) => file.records.push(record),
                Err(e) => {
                    debug!(line = index + 1, error = %e, "Skipping malformed usage line");
                    file.malformed += 1;
                }
            }
        }
        file
    }
}
