//! Transcript entries

use serde::{Deserialize, Serialize};

/// Opaque, key-ordered metadata carried verbatim from the wire
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Who produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Human,
    /// Any non-human producer (assistant, tool, ...)
    Agent,
    /// Out-of-band custom event
    Signal,
}

impl EntryKind {
    /// Wire `type` mapping: `human` stays human, everything else is agent
    #[must_use]
    pub fn from_wire_type(wire_type: &str) -> Self {
        if wire_type == "human" {
            Self::Human
        } else {
            Self::Agent
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Agent => "agent",
            Self::Signal => "signal",
        }
    }
}

/// One entry in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: String,
    pub kind: EntryKind,
    /// Wire `type` as last seen (`human` for locally submitted input,
    /// `custom_event` for signals)
    pub role: String,
    pub content: String,
    pub response_metadata: Metadata,
    pub additional_kwargs: Metadata,
}

impl TranscriptEntry {
    #[must_use]
    pub fn human(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: EntryKind::Human,
            role: "human".to_string(),
            content: content.into(),
            response_metadata: Metadata::new(),
            additional_kwargs: Metadata::new(),
        }
    }

    #[must_use]
    pub fn signal(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: EntryKind::Signal,
            role: "custom_event".to_string(),
            content: content.into(),
            response_metadata: Metadata::new(),
            additional_kwargs: Metadata::new(),
        }
    }

    /// Append `fragment` unless the content already ends with it.
    ///
    /// Returns whether the content grew.
    pub fn append(&mut self, fragment: &str) -> bool {
        if self.content.ends_with(fragment) {
            return false;
        }
        self.content.push_str(fragment);
        true
    }
}
