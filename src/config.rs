//! Client configuration

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the streaming client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Agent server base URL (e.g., `http://localhost:8000`)
    pub base_url: String,
    /// Time allowed to establish the connection. The body itself has no
    /// deadline: a response may legitimately stream for minutes.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("TRANSCRIPT_STREAM_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let connect_timeout = lookup("TRANSCRIPT_STREAM_CONNECT_TIMEOUT_SECS")
            .and_then(|secs| secs.trim().parse().ok())
            .map_or(
                Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
                Duration::from_secs,
            );

        Self {
            base_url,
            connect_timeout,
        }
    }
}
