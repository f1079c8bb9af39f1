//! Driving loop for one streaming exchange
//!
//! pull chunk -> frame lines -> decode events -> reconcile -> publish
//!
//! The chunk pull is the only suspension point. Decoding and reconciliation
//! for a chunk run to completion before the next pull, so cancellation takes
//! effect between chunks and never leaves a half-applied event behind.

#[cfg(test)]
pub mod testing;

use crate::decoder::decode_line;
use crate::error::{excerpt, StreamError};
use crate::framer::LineFramer;
use crate::session::SessionContext;
use crate::transcript::Transcript;
use crate::transport::{Pull, Transport, TransportReader};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How a streaming exchange ended, when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The server closed the stream
    Finished,
    /// The caller triggered the cancellation token
    Cancelled,
    /// Blank input; nothing was sent
    Ignored,
}

/// Presentation-side receiver of transcript updates
pub trait TranscriptSink: Send + Sync {
    /// Full ordered transcript after each applied change
    fn publish(&self, transcript: Arc<Transcript>);

    /// Exactly once per exchange that was actually started
    fn terminated(&self, outcome: &Result<Completion, StreamError>);
}

/// Channel form of [`TranscriptSink`] notifications
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Snapshot(Arc<Transcript>),
    Completed,
    Cancelled,
    Failed(StreamError),
}

impl TranscriptSink for mpsc::UnboundedSender<EngineEvent> {
    fn publish(&self, transcript: Arc<Transcript>) {
        let _ = self.send(EngineEvent::Snapshot(transcript));
    }

    fn terminated(&self, outcome: &Result<Completion, StreamError>) {
        let event = match outcome {
            Ok(Completion::Finished | Completion::Ignored) => EngineEvent::Completed,
            Ok(Completion::Cancelled) => EngineEvent::Cancelled,
            Err(e) => EngineEvent::Failed(e.clone()),
        };
        let _ = self.send(event);
    }
}

/// One conversational session: its context, transport and transcript.
///
/// `send` takes `&mut self`, so a session runs at most one streaming
/// operation at a time.
pub struct ChatSession<T: Transport> {
    context: SessionContext,
    transport: T,
    transcript: Arc<Transcript>,
}

impl<T: Transport> ChatSession<T> {
    #[must_use]
    pub fn new(context: SessionContext, transport: T) -> Self {
        Self {
            context,
            transport,
            transcript: Arc::new(Transcript::new()),
        }
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Current transcript snapshot
    #[must_use]
    pub fn transcript(&self) -> Arc<Transcript> {
        Arc::clone(&self.transcript)
    }

    /// Start a new session, discarding the current transcript
    pub fn reset(&mut self, context: SessionContext) {
        tracing::info!(
            previous = %self.context.session_id(),
            session_id = %context.session_id(),
            "Starting new session"
        );
        self.context = context;
        self.transcript = Arc::new(Transcript::new());
    }

    /// Submit `message` and stream the response into the transcript.
    ///
    /// The human entry is recorded and published before any network
    /// activity. Transcript state published before a failure or cancellation
    /// is kept.
    ///
    /// # Errors
    ///
    /// Transport failures and undecodable lines end the exchange with the
    /// corresponding [`StreamError`]. Cancellation is `Ok(Completion::Cancelled)`.
    pub async fn send(
        &mut self,
        message: &str,
        cancel: &CancellationToken,
        sink: &dyn TranscriptSink,
    ) -> Result<Completion, StreamError> {
        if message.trim().is_empty() {
            return Ok(Completion::Ignored);
        }

        let human_id = uuid::Uuid::new_v4().to_string();
        Arc::make_mut(&mut self.transcript).push_human(human_id, message);
        sink.publish(self.transcript());

        tracing::info!(session_id = %self.context.session_id(), "Streaming exchange started");
        let outcome = self.stream_response(message, cancel, sink).await;

        match &outcome {
            Ok(completion) => tracing::info!(
                session_id = %self.context.session_id(),
                entries = self.transcript.len(),
                outcome = ?completion,
                "Streaming exchange ended"
            ),
            Err(e) => tracing::error!(
                session_id = %self.context.session_id(),
                entries = self.transcript.len(),
                kind = %e.kind,
                error = %e.message,
                "Streaming exchange failed"
            ),
        }
        sink.terminated(&outcome);
        outcome
    }

    async fn stream_response(
        &mut self,
        message: &str,
        cancel: &CancellationToken,
        sink: &dyn TranscriptSink,
    ) -> Result<Completion, StreamError> {
        // Race the open against cancellation
        let chunks = tokio::select! {
            biased;

            () = cancel.cancelled() => return Ok(Completion::Cancelled),
            opened = self.transport.open(&self.context, message) => opened?,
        };

        let mut reader = TransportReader::new(chunks, cancel.clone());
        let mut framer = LineFramer::new();

        loop {
            match reader.next_chunk().await? {
                Pull::Chunk(chunk) => {
                    for line in framer.push(&chunk) {
                        let events = decode_line(&line)?;
                        if events.is_empty() {
                            tracing::debug!(line = %excerpt(&line), "Skipped line with no transcript event");
                        }
                        for event in events {
                            Arc::make_mut(&mut self.transcript).apply(event);
                            sink.publish(self.transcript());
                        }
                    }
                }
                Pull::End => {
                    let dropped = framer.finish();
                    if dropped > 0 {
                        tracing::debug!(dropped, "Discarded unterminated trailing data");
                    }
                    return Ok(Completion::Finished);
                }
                Pull::Cancelled => return Ok(Completion::Cancelled),
            }
        }
    }
}
