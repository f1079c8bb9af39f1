//! Test doubles for the driving loop
//!
//! `ScriptedTransport` replays canned chunk scripts, one per `open`, and
//! counts how many chunk streams were released. `RecordingSink` keeps every
//! notification and can trigger cancellation after a number of publishes.

use super::{Completion, TranscriptSink};
use crate::error::StreamError;
use crate::session::SessionContext;
use crate::transcript::Transcript;
use crate::transport::{ChunkStream, Transport};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Scripted transport
// ============================================================================

enum Script {
    Chunks {
        items: Vec<Result<Vec<u8>, StreamError>>,
        hang: bool,
    },
    OpenError(StreamError),
}

/// Counts released chunk streams
#[derive(Clone, Default)]
pub struct ReleaseCounter(Arc<AtomicUsize>);

impl ReleaseCounter {
    #[must_use]
    pub fn load(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Chunk stream that bumps a counter when dropped
struct Tracked {
    inner: ChunkStream,
    released: ReleaseCounter,
}

impl futures::Stream for Tracked {
    type Item = Result<Vec<u8>, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.released.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Transport that replays queued scripts, one per `open`
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    opened: Arc<Mutex<Vec<(String, String)>>>,
    released: ReleaseCounter,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response made of the given text chunks
    #[must_use]
    pub fn with_chunks(self, chunks: &[&str]) -> Self {
        self.with_script(chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect())
    }

    /// Queue a response with explicit chunk results
    #[must_use]
    pub fn with_script(self, items: Vec<Result<Vec<u8>, StreamError>>) -> Self {
        self.push(Script::Chunks { items, hang: false })
    }

    /// Queue a failure to open
    #[must_use]
    pub fn with_open_error(self, error: StreamError) -> Self {
        self.push(Script::OpenError(error))
    }

    /// Keep the most recently queued response open after its chunks
    #[must_use]
    pub fn then_hang(self) -> Self {
        if let Some(Script::Chunks { hang, .. }) = self.scripts.lock().unwrap().back_mut() {
            *hang = true;
        }
        self
    }

    /// (`session_id`, message) for every `open` that ran
    #[must_use]
    pub fn opened(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.opened)
    }

    #[must_use]
    pub fn released(&self) -> ReleaseCounter {
        self.released.clone()
    }

    fn push(self, script: Script) -> Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(
        &self,
        session: &SessionContext,
        message: &str,
    ) -> Result<ChunkStream, StreamError> {
        self.opened
            .lock()
            .unwrap()
            .push((session.session_id().to_string(), message.to_string()));

        let script = self.scripts.lock().unwrap().pop_front();
        let (items, hang) = match script {
            Some(Script::Chunks { items, hang }) => (items, hang),
            Some(Script::OpenError(error)) => return Err(error),
            None => (Vec::new(), false),
        };

        let inner = if hang {
            stream::iter(items).chain(stream::pending()).boxed()
        } else {
            stream::iter(items).boxed()
        };
        Ok(Tracked {
            inner,
            released: self.released.clone(),
        }
        .boxed())
    }
}

// ============================================================================
// Recording sink
// ============================================================================

/// Sink that records every notification
#[derive(Default)]
pub struct RecordingSink {
    snapshots: Mutex<Vec<Arc<Transcript>>>,
    terminations: Mutex<Vec<Result<Completion, StreamError>>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger `token` once `publishes` snapshots have been received
    #[must_use]
    pub fn cancel_after(mut self, publishes: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((publishes, token));
        self
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<Arc<Transcript>> {
        self.snapshots.lock().unwrap().clone()
    }

    #[must_use]
    pub fn terminations(&self) -> Vec<Result<Completion, StreamError>> {
        self.terminations.lock().unwrap().clone()
    }
}

impl TranscriptSink for RecordingSink {
    fn publish(&self, transcript: Arc<Transcript>) {
        let mut snapshots = self.snapshots.lock().unwrap();
        snapshots.push(transcript);
        if let Some((publishes, token)) = &self.cancel_after {
            if snapshots.len() >= *publishes {
                token.cancel();
            }
        }
    }

    fn terminated(&self, outcome: &Result<Completion, StreamError>) {
        self.terminations.lock().unwrap().push(outcome.clone());
    }
}
