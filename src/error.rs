//! Stream error types

use std::fmt;
use thiserror::Error;

/// Longest excerpt of a line or response body carried in an error message
const EXCERPT_CHARS: usize = 200;

/// Streaming error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct StreamError {
    pub kind: StreamErrorKind,
    pub message: String,
}

impl StreamError {
    #[must_use]
    pub fn new(kind: StreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Transport, message)
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Decode, message)
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Config, message)
    }

    /// Map a reqwest failure onto a transport error
    #[must_use]
    pub fn from_reqwest(context: &str, e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::transport(format!("{context}: timeout: {e}"))
        } else if e.is_connect() {
            Self::transport(format!("{context}: connection failed: {e}"))
        } else {
            Self::transport(format!("{context}: {e}"))
        }
    }
}

/// Error classification surfaced in terminal notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamErrorKind {
    /// Stream could not be established or the connection failed mid-stream
    Transport,
    /// A framed line was not a valid event (protocol desync)
    Decode,
    /// Invalid client configuration
    Config,
}

impl StreamErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded, char-safe excerpt of `text` for error messages
pub(crate) fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let mut out: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        out.push('…');
    }
    out
}
