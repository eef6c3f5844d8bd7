use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokentrace_cli::{build_exporter, ExportConfig, UsageFile, UsageSummary};
use tokentrace_sdk::{ExportRuntime, UsageExporter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tokentrace")]
#[command(about = "Inspect and replay generative-AI token usage records")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print per-model totals for a JSONL usage file
    Summarize {
        /// Usage file written by the file sink
        file: PathBuf,
    },

    /// Export every record of a JSONL usage file to the configured sink
    Replay {
        /// Usage file written by the file sink
        file: PathBuf,

        /// TOML export configuration (TOKENTRACE__* variables override it)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seconds to wait for queued exports before exiting
        #[arg(long, default_value = "10")]
        drain_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Summarize { file } => summarize(&file),
        Command::Replay {
            file,
            config,
            drain_timeout,
        } => replay(&file, config, Duration::from_secs(drain_timeout)).await,
    }
}

fn summarize(file: &std::path::Path) -> Result<()> {
    let usage = UsageFile::load(file)?;
    let mut summary = UsageSummary::from_records(&usage.records);
    summary.malformed = usage.malformed;
    print!("{}", summary);
    Ok(())
}

async fn replay(file: &std::path::Path, config: Option<PathBuf>, drain_timeout: Duration) -> Result<()> {
    let config = ExportConfig::load(config.as_deref())?;
    let usage = UsageFile::load(file)?;
    if usage.malformed > 0 {
        warn!(malformed = usage.malformed, "Skipping malformed usage lines");
    }

    let exporter = build_exporter(&config).await?;
    let count = usage.records.len();
    for record in usage.records {
        exporter.export(record);
    }

    let runtime = ExportRuntime::global()?;
    let waiter = runtime.clone();
    let drained = tokio::task::spawn_blocking(move || waiter.wait_idle(drain_timeout)).await?;
    if drained {
        info!(count, "Replayed usage records");
    } else {
        warn!(
            count,
            pending = runtime.pending(),
            "Timed out waiting for exports to finish"
        );
    }
    Ok(())
}
