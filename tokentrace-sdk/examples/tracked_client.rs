//! Example: Tracking a blocking client
//!
//! Wraps a toy model in a `TrackedClient` and writes one usage record per
//! call (and one per exhausted stream) to a JSONL file.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example tracked_client -- usage.jsonl
//! ```

use std::convert::Infallible;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokentrace_sdk::{
    AuthContext, ExportRuntime, GenerativeModel, JsonlFileSink, ReportsUsage, SyncExporter,
    TrackedClient, UsageMetadata, UsageTracker, VideoOptions,
};

/// Answers every prompt by echoing it, one word per chunk.
struct EchoModel;

struct Reply {
    text: String,
    usage: Option<UsageMetadata>,
}

impl ReportsUsage for Reply {
    fn usage_metadata(&self) -> Option<UsageMetadata> {
        self.usage
    }
}

struct Pictures(u64);

impl ReportsUsage for Pictures {
    fn usage_metadata(&self) -> Option<UsageMetadata> {
        Some(UsageMetadata::new(4, 0))
    }

    fn images_generated(&self) -> u64 {
        self.0
    }
}

struct NoVideoOptions;

impl VideoOptions for NoVideoOptions {}

impl GenerativeModel for EchoModel {
    type Error = Infallible;
    type ContentRequest = String;
    type Response = Reply;
    type Chunk = Reply;
    type Stream = std::vec::IntoIter<Result<Reply, Infallible>>;
    type ImageRequest = u64;
    type ImageResponse = Pictures;
    type VideoRequest = NoVideoOptions;
    type VideoResponse = Reply;

    fn generate_content(&self, _model: &str, prompt: String) -> Result<Reply, Infallible> {
        let words = prompt.split_whitespace().count() as u64;
        Ok(Reply {
            text: prompt,
            usage: Some(UsageMetadata::new(words, words)),
        })
    }

    fn generate_content_stream(&self, _model: &str, prompt: String) -> Result<Self::Stream, Infallible> {
        let words: Vec<String> = prompt.split_whitespace().map(str::to_string).collect();
        let total = words.len() as u64;
        let chunks: Vec<_> = words
            .into_iter()
            .enumerate()
            .map(|(i, word)| {
                Ok(Reply {
                    text: word,
                    // Cumulative counts; only the last chunk is recorded.
                    usage: Some(UsageMetadata::new(total, i as u64 + 1)),
                })
            })
            .collect();
        Ok(chunks.into_iter())
    }

    fn generate_images(&self, _model: &str, count: u64) -> Result<Pictures, Infallible> {
        Ok(Pictures(count))
    }

    fn generate_videos(&self, _model: &str, _request: NoVideoOptions) -> Result<Reply, Infallible> {
        Ok(Reply {
            text: String::new(),
            usage: Some(UsageMetadata::new(12, 0)),
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args().nth(1).unwrap_or_else(|| "usage.jsonl".to_string());

    let exporter = SyncExporter::new(JsonlFileSink::new(&path))?;
    let tracker = UsageTracker::builder()
        .agent_name("echo-demo")
        .auth(AuthContext::api_key())
        .exporter(Arc::new(exporter))
        .build()?;
    let client = TrackedClient::new(EchoModel, tracker);

    let reply = client.generate_content("echo-1", "hello token accounting".to_string())?;
    println!("content: {}", reply.text);

    for chunk in client.generate_content_stream("echo-1", "one word at a time".to_string())? {
        print!("{} ", chunk?.text);
    }
    println!();

    let pictures = client.generate_images("echo-image-1", 2)?;
    println!("images: {}", pictures.0);

    client.generate_videos("echo-video-1", NoVideoOptions)?;

    ExportRuntime::global()?.wait_idle(Duration::from_secs(5));
    println!("usage written to {}", path);
    Ok(())
}
