//! Streaming transcript client
//!
//! Consumes a newline-delimited JSON event stream produced by an agent
//! server and reconciles it, in real time, into an ordered transcript of
//! human, agent and signal entries.

pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod framer;
pub mod session;
pub mod transcript;
pub mod transport;

pub use config::ClientConfig;
pub use decoder::{decode_line, StreamEvent};
pub use engine::{ChatSession, Completion, EngineEvent, TranscriptSink};
pub use error::{StreamError, StreamErrorKind};
pub use framer::LineFramer;
pub use session::SessionContext;
pub use transcript::{reconcile, EntryKind, Metadata, Transcript, TranscriptEntry};
pub use transport::{ChunkStream, HttpTransport, Pull, Transport, TransportReader};
