// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat messages and stream positions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier assigned to a message when it is published.
///
/// Only compared for equality; position in the log is what orders messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A published chat message. Never mutated after it enters the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Raw text as submitted
    pub body: String,
    /// Display form produced by the renderer
    pub rendered: String,
}

/// Position of a subscriber in the message stream.
///
/// Serialized as an optional id so clients can send `null` or omit it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<MessageId>", into = "Option<MessageId>")]
pub enum Cursor {
    /// No prior position; the whole log is new
    #[default]
    None,
    /// The id of the last message the subscriber has seen
    At(MessageId),
}

impl Cursor {
    pub fn at(id: impl Into<MessageId>) -> Self {
        Cursor::At(id.into())
    }

    /// True if this cursor points at the given message
    pub fn is_at(&self, id: &MessageId) -> bool {
        matches!(self, Cursor::At(cursor) if cursor == id)
    }

    pub fn id(&self) -> Option<&MessageId> {
        match self {
            Cursor::None => None,
            Cursor::At(id) => Some(id),
        }
    }
}

impl From<Option<MessageId>> for Cursor {
    fn from(id: Option<MessageId>) -> Self {
        id.map_or(Cursor::None, Cursor::At)
    }
}

impl From<Cursor> for Option<MessageId> {
    fn from(cursor: Cursor) -> Self {
        match cursor {
            Cursor::None => None,
            Cursor::At(id) => Some(id),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::None => write!(f, "none"),
            Cursor::At(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
