//! Decorator that exports usage for every tracked client call.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::Stream;
use tokentrace_types::MethodName;

use crate::client::{
    AsyncGenerativeModel, ChunkStream, GenerativeModel, ReportsUsage, UsageMetadata, VideoOptions,
};
use crate::tracker::UsageTracker;

/// Wraps a client and exports one usage record per completed call.
///
/// `TrackedClient<C>` implements [`GenerativeModel`] when `C` does and
/// [`AsyncGenerativeModel`] when `C` does, forwarding every call unchanged.
/// After a call succeeds a record is built from the response and exported;
/// failed calls and calls without any usage export nothing.
///
/// Blocking calls hand the record to the tracker's [`UsageExporter`](crate::UsageExporter)
/// and return immediately. Async calls await the tracker's sink before
/// returning the response.
///
/// Streams are passed through chunk by chunk; the record is built from the
/// last chunk once the stream is exhausted.
#[derive(Debug, Clone)]
pub struct TrackedClient<C> {
    inner: C,
    tracker: UsageTracker,
}

impl<C> TrackedClient<C> {
    pub fn new(inner: C, tracker: UsageTracker) -> Self {
        Self { inner, tracker }
    }

    /// The wrapped client, for operations that are not tracked.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

fn videos_requested<R: VideoOptions>(request: &R) -> u64 {
    request.number_of_videos().unwrap_or(1)
}

impl<C: GenerativeModel> GenerativeModel for TrackedClient<C> {
    type Error = C::Error;
    type ContentRequest = C::ContentRequest;
    type Response = C::Response;
    type Chunk = C::Chunk;
    type Stream = TrackedIter<C::Stream>;
    type ImageRequest = C::ImageRequest;
    type ImageResponse = C::ImageResponse;
    type VideoRequest = C::VideoRequest;
    type VideoResponse = C::VideoResponse;

    fn generate_content(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<Self::Response, Self::Error> {
        let response = self.inner.generate_content(model, request)?;
        self.tracker.capture_blocking(
            model,
            MethodName::GenerateContent,
            response.usage_metadata(),
            0,
            0,
        );
        Ok(response)
    }

    fn generate_content_stream(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<Self::Stream, Self::Error> {
        let stream = self.inner.generate_content_stream(model, request)?;
        Ok(TrackedIter {
            inner: stream,
            tracker: self.tracker.clone(),
            model: model.to_string(),
            last_usage: None,
            failed: false,
            finished: false,
        })
    }

    fn generate_images(
        &self,
        model: &str,
        request: Self::ImageRequest,
    ) -> Result<Self::ImageResponse, Self::Error> {
        let response = self.inner.generate_images(model, request)?;
        self.tracker.capture_blocking(
            model,
            MethodName::GenerateImages,
            response.usage_metadata(),
            response.images_generated(),
            0,
        );
        Ok(response)
    }

    fn generate_videos(
        &self,
        model: &str,
        request: Self::VideoRequest,
    ) -> Result<Self::VideoResponse, Self::Error> {
        let videos = videos_requested(&request);
        let response = self.inner.generate_videos(model, request)?;
        self.tracker.capture_blocking(
            model,
            MethodName::GenerateVideos,
            response.usage_metadata(),
            0,
            videos,
        );
        Ok(response)
    }
}

#[async_trait]
impl<C> AsyncGenerativeModel for TrackedClient<C>
where
    C: AsyncGenerativeModel,
{
    type Error = C::Error;
    type ContentRequest = C::ContentRequest;
    type Response = C::Response;
    type Chunk = C::Chunk;
    type ImageRequest = C::ImageRequest;
    type ImageResponse = C::ImageResponse;
    type VideoRequest = C::VideoRequest;
    type VideoResponse = C::VideoResponse;

    async fn generate_content(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<Self::Response, Self::Error> {
        let response = self.inner.generate_content(model, request).await?;
        self.tracker
            .capture_async(
                model,
                MethodName::GenerateContent,
                response.usage_metadata(),
                0,
                0,
            )
            .await;
        Ok(response)
    }

    async fn generate_content_stream(
        &self,
        model: &str,
        request: Self::ContentRequest,
    ) -> Result<ChunkStream<Self::Chunk, Self::Error>, Self::Error> {
        let stream = self.inner.generate_content_stream(model, request).await?;
        Ok(Box::pin(TrackedStream {
            inner: stream,
            tracker: self.tracker.clone(),
            model: model.to_string(),
            last_usage: None,
            failed: false,
            export: None,
            finished: false,
        }))
    }

    async fn generate_images(
        &self,
        model: &str,
        request: Self::ImageRequest,
    ) -> Result<Self::ImageResponse, Self::Error> {
        let response = self.inner.generate_images(model, request).await?;
        self.tracker
            .capture_async(
                model,
                MethodName::GenerateImages,
                response.usage_metadata(),
                response.images_generated(),
                0,
            )
            .await;
        Ok(response)
    }

    async fn generate_videos(
        &self,
        model: &str,
        request: Self::VideoRequest,
    ) -> Result<Self::VideoResponse, Self::Error> {
        let videos = videos_requested(&request);
        let response = self.inner.generate_videos(model, request).await?;
        self.tracker
            .capture_async(
                model,
                MethodName::GenerateVideos,
                response.usage_metadata(),
                0,
                videos,
            )
            .await;
        Ok(response)
    }
}

/// Blocking chunk iterator that exports usage once it is exhausted.
///
/// Every item is yielded unchanged. An error item marks the stream as failed
/// and suppresses the export; dropping the iterator early does too.
#[derive(Debug)]
pub struct TrackedIter<I> {
    inner: I,
    tracker: UsageTracker,
    model: String,
    last_usage: Option<UsageMetadata>,
    failed: bool,
    finished: bool,
}

impl<I, T, E> Iterator for TrackedIter<I>
where
    I: Iterator<Item = Result<T, E>>,
    T: ReportsUsage,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.inner.next() {
            Some(Ok(chunk)) => {
                self.last_usage = chunk.usage_metadata();
                Some(Ok(chunk))
            }
            Some(Err(e)) => {
                self.failed = true;
                Some(Err(e))
            }
            None => {
                self.finished = true;
                if !self.failed {
                    self.tracker.capture_blocking(
                        &self.model,
                        MethodName::GenerateContentStream,
                        self.last_usage.take(),
                        0,
                        0,
                    );
                }
                None
            }
        }
    }
}

/// Async chunk stream that awaits the usage export once it is exhausted.
///
/// The final `None` is only returned after the sink's export has completed,
/// matching the directly-awaited semantics of the other async calls.
pub struct TrackedStream<T, E> {
    inner: ChunkStream<T, E>,
    tracker: UsageTracker,
    model: String,
    last_usage: Option<UsageMetadata>,
    failed: bool,
    export: Option<BoxFuture<'static, ()>>,
    finished: bool,
}

impl<T, E> TrackedStream<T, E> {
    fn start_export(&mut self) -> Option<BoxFuture<'static, ()>> {
        if self.failed {
            return None;
        }
        let record = self.tracker.record(
            &self.model,
            MethodName::GenerateContentStream,
            self.last_usage.take(),
            0,
            0,
        )?;
        let sink = self.tracker.sink();
        Some(Box::pin(async move {
            sink.export(&record).await;
        }))
    }
}

impl<T, E> Stream for TrackedStream<T, E>
where
    T: ReportsUsage,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(export) = this.export.as_mut() {
                ready!(export.as_mut().poll(cx));
                this.export = None;
                this.finished = true;
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    this.last_usage = chunk.usage_metadata();
                    return Poll::Ready(Some(Ok(chunk)));
                }
                Some(Err(e)) => {
                    this.failed = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => match this.start_export() {
                    Some(export) => this.export = Some(export),
                    None => this.finished = true,
                },
            }
        }
    }
}

impl<T, E> std::fmt::Debug for TrackedStream<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedStream")
            .field("model", &self.model)
            .field("failed", &self.failed)
            .field("finished", &self.finished)
            .finish()
    }
}
