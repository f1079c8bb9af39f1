//! Wire event decoding
//!
//! Each framed line is one JSON object of one of two shapes:
//!
//! ```text
//! {"id": "...", "type": "...", "content": "...", "response_metadata"?: {...}, "additional_kwargs"?: {...}}
//! {"custom_event": "..."}
//! ```
//!
//! A single object may carry both shapes; it then yields a delta followed by
//! a signal. An object with neither shape (e.g. the server's `{"timer": ...}`
//! writer output) yields no events.

use crate::error::{excerpt, StreamError};
use crate::transcript::{EntryKind, Metadata};
use serde_json::Value;

/// A decoded wire event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Content fragment for the entry identified by `id`
    Delta {
        id: String,
        kind: EntryKind,
        /// Raw wire `type` (e.g. `ai`, `tool`)
        role: String,
        content: String,
        response_metadata: Metadata,
        additional_kwargs: Metadata,
    },
    /// Out-of-band notification rendered as its own entry
    Signal { id: String, content: String },
}

impl StreamEvent {
    /// Delta with empty metadata
    #[must_use]
    pub fn delta(id: impl Into<String>, role: impl Into<String>, content: impl Into<String>) -> Self {
        let role = role.into();
        Self::Delta {
            id: id.into(),
            kind: EntryKind::from_wire_type(&role),
            role,
            content: content.into(),
            response_metadata: Metadata::new(),
            additional_kwargs: Metadata::new(),
        }
    }

    /// Signal with a freshly generated identity
    #[must_use]
    pub fn signal(content: impl Into<String>) -> Self {
        Self::Signal {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
        }
    }
}

/// Decode one framed line into its events, in application order.
///
/// Returns zero, one or two events; an object of neither shape yields none.
///
/// # Errors
///
/// Malformed JSON, a non-object value, or a delta with a missing id or
/// ill-typed content/metadata is a decode error.
pub fn decode_line(line: &str) -> Result<Vec<StreamEvent>, StreamError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| StreamError::decode(format!("Invalid JSON ({e}): {}", excerpt(line))))?;
    let Value::Object(mut object) = value else {
        return Err(StreamError::decode(format!(
            "Expected a JSON object: {}",
            excerpt(line)
        )));
    };

    let mut events = Vec::with_capacity(1);

    let role = object
        .get("type")
        .and_then(Value::as_str)
        .filter(|role| !role.is_empty())
        .map(str::to_owned);
    if let Some(role) = role {
        let Some(Value::String(id)) = object.remove("id") else {
            return Err(StreamError::decode(format!(
                "Delta event without a string id: {}",
                excerpt(line)
            )));
        };
        let content = content_text(object.remove("content"))
            .ok_or_else(|| StreamError::decode(format!("Unsupported content: {}", excerpt(line))))?;
        let response_metadata = metadata(object.remove("response_metadata"), "response_metadata")?;
        let additional_kwargs = metadata(object.remove("additional_kwargs"), "additional_kwargs")?;

        events.push(StreamEvent::Delta {
            id,
            kind: EntryKind::from_wire_type(&role),
            role,
            content,
            response_metadata,
            additional_kwargs,
        });
    }

    match object.remove("custom_event") {
        None | Some(Value::Null) => {}
        Some(Value::String(content)) => events.push(StreamEvent::signal(content)),
        Some(other) => events.push(StreamEvent::signal(other.to_string())),
    }

    Ok(events)
}

/// Text of a `content` field: a plain string, or a list of content blocks.
fn content_text(content: Option<Value>) -> Option<String> {
    match content {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(text)) => Some(text),
        Some(Value::Array(blocks)) => Some(
            blocks
                .iter()
                .filter_map(|block| match block {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(fields) => fields.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect(),
        ),
        Some(_) => None,
    }
}

fn metadata(value: Option<Value>, field: &str) -> Result<Metadata, StreamError> {
    match value {
        None | Some(Value::Null) => Ok(Metadata::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(StreamError::decode(format!(
            "{field} must be an object, got {}",
            excerpt(&other.to_string())
        ))),
    }
}
