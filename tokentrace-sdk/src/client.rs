//! The generative-AI client operations that are tracked.
//!
//! The SDK does not ship a client. Implement [`GenerativeModel`] and/or
//! [`AsyncGenerativeModel`] for your transport and wrap it in a
//! [`TrackedClient`](crate::TrackedClient).

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Token counts reported on a model response or stream chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    pub prompt_token_count: u64,
    pub candidates_token_count: u64,
    pub thoughts_token_count: Option<u64>,
    pub cached_content_token_count: Option<u64>,
    pub tool_use_prompt_token_count: Option<u64>,
}

impl UsageMetadata {
    pub fn new(prompt_token_count: u64, candidates_token_count: u64) -> Self {
        Self {
            prompt_token_count,
            candidates_token_count,
            ..Self::default()
        }
    }
}

/// A response that may carry usage metadata.
pub trait ReportsUsage {
    /// Usage metadata, if the backend reported any.
    fn usage_metadata(&self) -> Option<UsageMetadata>;

    /// Number of images contained in the response.
    fn images_generated(&self) -> u64 {
        0
    }
}

/// Options of a video generation request.
pub trait VideoOptions {
    /// Requested number of videos. `None` counts as one.
    fn number_of_videos(&self) -> Option<u64> {
        None
    }
}

/// A blocking generative-AI client exposing the tracked operations.
pub trait GenerativeModel {
    type Error;
    type ContentRequest;
    type Response: ReportsUsage;
    type Chunk: ReportsUsage;
    type Stream: Iterator<Item = Result<Self::Chunk, Self::Error>>;
    type ImageRequest;
    type ImageResponse: ReportsUsage;
    type VideoRequest: VideoOptions;
    type VideoResponse: ReportsUsage;

    fn generate_content(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<Self::Response, Self::Error>;

    fn generate_content_stream(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<Self::Stream, Self::Error>;

    fn generate_images(
        &self,
        model: &str,
        request: Self::ImageRequest,
    ) -> Result<Self::ImageResponse, Self::Error>;

    fn generate_videos(
        &self,
        model: &str,
        request: Self::VideoRequest,
    ) -> Result<Self::VideoResponse, Self::Error>;
}

/// Stream of content chunks returned by [`AsyncGenerativeModel::generate_content_stream`].
pub type ChunkStream<T, E> = BoxStream<'static, Result<T, E>>;

/// An async generative-AI client exposing the tracked operations.
#[async_trait]
pub trait AsyncGenerativeModel: Send + Sync {
    type Error: Send + 'static;
    type ContentRequest: Send;
    type Response: ReportsUsage + Send;
    type Chunk: ReportsUsage + Send + 'static;
    type ImageRequest: Send;
    type ImageResponse: ReportsUsage + Send;
    type VideoRequest: VideoOptions + Send;
    type VideoResponse: ReportsUsage + Send;

    async fn generate_content(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<Self::Response, Self::Error>;

    async fn generate_content_stream(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<ChunkStream<Self::Chunk, Self::Error>, Self::Error>;

    async fn generate_images(
        &self,
        model: &str,
        request: Self::ImageRequest,
    ) -> Result<Self::ImageResponse, Self::Error>;

    async fn generate_videos(
        &self,
        model: &str,
        request: Self::VideoRequest,
    ) -> Result<Self::VideoResponse, Self::Error>;
}
