//! Chunked transport for the event stream
//!
//! A [`Transport`] opens one streaming operation and hands back the raw
//! byte-chunk stream. [`TransportReader`] wraps that stream with the
//! operation's cancellation token and owns it until the exchange ends.

use crate::config::ClientConfig;
use crate::error::{excerpt, StreamError};
use crate::session::SessionContext;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Url};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Raw byte chunks of one response body
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, StreamError>>;

/// Opens streaming operations for a session
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `message` and return the response body as a chunk stream.
    ///
    /// Fails with a transport error if no response body can be obtained.
    async fn open(&self, session: &SessionContext, message: &str)
        -> Result<ChunkStream, StreamError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn open(
        &self,
        session: &SessionContext,
        message: &str,
    ) -> Result<ChunkStream, StreamError> {
        (**self).open(session, message).await
    }
}

// ============================================================================
// HTTP transport
// ============================================================================

#[derive(Debug, Serialize)]
struct StreamRequest<'a> {
    message: &'a str,
}

/// POSTs to `{base}/threads/{session_id}/stream` and streams the body
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Fails with a config error if the base URL does not parse, cannot
    /// carry a path, or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, StreamError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| StreamError::config(format!("Invalid base URL {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(StreamError::config(format!(
                "Base URL cannot have a path: {}",
                config.base_url
            )));
        }
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StreamError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(
        &self,
        session: &SessionContext,
        message: &str,
    ) -> Result<ChunkStream, StreamError> {
        let url = session.stream_url(&self.base_url)?;
        tracing::debug!(%url, session_id = %session.session_id(), "Opening stream");

        let response = self
            .client
            .post(url)
            .json(&StreamRequest { message })
            .send()
            .await
            .map_err(|e| StreamError::from_reqwest("Request failed", &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::transport(format!(
                "HTTP {status}: {}",
                excerpt(&body)
            )));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| StreamError::from_reqwest("Stream interrupted", &e))
            })
            .boxed())
    }
}

// ============================================================================
// Cancellable reader
// ============================================================================

/// Result of one pull
#[derive(Debug, PartialEq, Eq)]
pub enum Pull {
    Chunk(Vec<u8>),
    End,
    Cancelled,
}

/// Cancellable pull interface over one operation's chunk stream.
///
/// Owns the underlying body; dropping the reader releases the connection on
/// every exit path.
pub struct TransportReader {
    chunks: Option<ChunkStream>,
    cancel: CancellationToken,
    bytes_read: usize,
}

impl TransportReader {
    #[must_use]
    pub fn new(chunks: ChunkStream, cancel: CancellationToken) -> Self {
        Self {
            chunks: Some(chunks),
            cancel,
            bytes_read: 0,
        }
    }

    /// Wait for the next chunk, end of stream, or cancellation.
    ///
    /// An already-triggered token wins over a ready chunk. After `End` or
    /// `Cancelled` the stream is released and every later pull repeats that
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns the transport error the underlying stream failed with.
    pub async fn next_chunk(&mut self) -> Result<Pull, StreamError> {
        if self.cancel.is_cancelled() {
            self.release();
            return Ok(Pull::Cancelled);
        }
        let Some(chunks) = self.chunks.as_mut() else {
            return Ok(Pull::End);
        };

        let next = tokio::select! {
            biased;

            () = self.cancel.cancelled() => None,
            next = chunks.next() => Some(next),
        };

        match next {
            None => {
                self.release();
                Ok(Pull::Cancelled)
            }
            Some(None) => {
                self.release();
                Ok(Pull::End)
            }
            Some(Some(Ok(chunk))) => {
                self.bytes_read += chunk.len();
                Ok(Pull::Chunk(chunk))
            }
            Some(Some(Err(e))) => {
                self.release();
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    fn release(&mut self) {
        if self.chunks.take().is_some() {
            tracing::debug!(bytes = self.bytes_read, "Transport released");
        }
    }
}

impl Drop for TransportReader {
    fn drop(&mut self) {
        self.release();
    }
}
