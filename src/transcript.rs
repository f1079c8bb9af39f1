//! Ordered transcript and the pure reconciliation step
//!
//! Entries appear in the order their id was first observed. Content only
//! grows, and a fragment the content already ends with is not appended
//! again, so replaying a delta does not duplicate text.

mod entry;

#[cfg(test)]
mod proptests;

pub use entry::{EntryKind, Metadata, TranscriptEntry};

use crate::decoder::StreamEvent;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

/// Ordered sequence of entries for one exchange
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    /// id -> position in `entries`
    index: HashMap<String, usize>,
    /// Ids recorded by `push_human`; deltas never touch these
    submitted: HashSet<String>,
}

impl PartialEq for Transcript {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for Transcript {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, TranscriptEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TranscriptEntry> {
        self.index.get(id).and_then(|&pos| self.entries.get(pos))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Record locally submitted input. Returns false (and changes nothing)
    /// if the id is already taken.
    pub fn push_human(&mut self, id: impl Into<String>, content: impl Into<String>) -> bool {
        let entry = TranscriptEntry::human(id, content);
        if self.contains(&entry.id) {
            return false;
        }
        self.submitted.insert(entry.id.clone());
        self.push(entry);
        true
    }

    /// Fold one event into the transcript in place.
    pub fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Delta {
                id,
                kind,
                role,
                content,
                response_metadata,
                additional_kwargs,
            } => {
                if self.submitted.contains(&id) {
                    return;
                }
                if let Some(existing) = self.index.get(&id).and_then(|&pos| self.entries.get_mut(pos)) {
                    existing.append(&content);
                    existing.kind = kind;
                    existing.role = role;
                } else {
                    self.push(TranscriptEntry {
                        id,
                        kind,
                        role,
                        content,
                        response_metadata,
                        additional_kwargs,
                    });
                }
            }
            StreamEvent::Signal { id, content } => {
                let id = self.unused_id(id);
                self.push(TranscriptEntry::signal(id, content));
            }
        }
    }

    fn push(&mut self, entry: TranscriptEntry) {
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// `id` itself, or the first `{id}-{n}` not yet present
    fn unused_id(&self, id: String) -> String {
        if !self.contains(&id) {
            return id;
        }
        let mut n: u64 = 1;
        loop {
            let candidate = format!("{id}-{n}");
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TranscriptEntry;
    type IntoIter = std::slice::Iter<'a, TranscriptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pure transition: `(transcript, event) -> transcript'`.
///
/// Deterministic given its inputs; signal ids are assigned by the decoder,
/// not here.
#[must_use]
pub fn reconcile(transcript: &Transcript, event: StreamEvent) -> Transcript {
    let mut next = transcript.clone();
    next.apply(event);
    next
}
