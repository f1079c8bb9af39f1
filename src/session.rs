//! Session context scoping one exchange

use crate::error::StreamError;
use reqwest::Url;

/// Stable identifier for one conversational exchange.
///
/// Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// New session with a random (UUID v4) identifier
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    #[must_use]
    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Per-session streaming endpoint: `{base}/threads/{session_id}/stream`
    ///
    /// # Errors
    ///
    /// Fails with a config error if `base` cannot carry a path.
    pub fn stream_url(&self, base: &Url) -> Result<Url, StreamError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| StreamError::config(format!("Base URL cannot have a path: {base}")))?
            .pop_if_empty()
            .extend(["threads", self.session_id.as_str(), "stream"]);
        Ok(url)
    }
}
