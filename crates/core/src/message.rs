// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation and message data model.
//!
//! A conversation between two participants is addressed by a
//! [`ConversationKey`] that does not depend on argument order. Each
//! conversation owns an ordered list of [`Message`]s.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator placed between the two sorted participant ids.
pub const KEY_SEPARATOR: char = '_';

/// Prefix carried by ids generated on the client while the remote store was unreachable.
pub const LOCAL_ID_PREFIX: &str = "local_";

const LOCAL_ID_RANDOM_LEN: usize = 9;

/// Canonical, order-independent identifier of a two-party conversation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Derives the key for the conversation between `a` and `b`.
    ///
    /// The two ids are sorted lexicographically before being joined, so
    /// `between(a, b) == between(b, a)`. Ids may not be blank or contain
    /// [`KEY_SEPARATOR`], which keeps keys of distinct pairs distinct.
    pub fn between(a: &str, b: &str) -> Result<Self> {
        for id in [a, b] {
            if id.trim().is_empty() || id.contains(KEY_SEPARATOR) {
                return Err(Error::InvalidParticipant(id.to_string()));
            }
        }
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Ok(ConversationKey(format!("{first}{KEY_SEPARATOR}{second}")))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a message within its conversation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        MessageId(id.into())
    }

    /// Generates a locally-originated id: `local_<unix millis>_<random>`.
    pub fn local(at: DateTime<Utc>) -> Self {
        let suffix = Alphanumeric.sample_string(&mut rand::thread_rng(), LOCAL_ID_RANDOM_LEN);
        MessageId(format!(
            "{LOCAL_ID_PREFIX}{}_{}",
            at.timestamp_millis(),
            suffix.to_lowercase()
        ))
    }

    /// Returns true if this id was generated on the client rather than by the remote store.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        MessageId(s.to_string())
    }
}

/// Message body: plain text or an arbitrary structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Structured(serde_json::Value),
}

impl Content {
    /// Returns the text if this is a plain-text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Structured(_) => None,
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Text(text) => f.write_str(text),
            Content::Structured(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<serde_json::Value> for Content {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Content::Text(text),
            other => Content::Structured(other),
        }
    }
}

/// A single direct message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    /// Author of the message. Never changes after creation.
    pub sender_id: String,
    pub content: Content,
    /// Client creation time. Immutable; used as the reconciliation key.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates an unedited message.
    pub fn new(
        id: MessageId,
        sender_id: impl Into<String>,
        content: impl Into<Content>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Message {
            id,
            sender_id: sender_id.into(),
            content: content.into(),
            timestamp,
            edited: false,
            edited_at: None,
        }
    }

    /// Returns a copy of this message carrying a different id.
    pub fn with_id(&self, id: MessageId) -> Self {
        Message {
            id,
            ..self.clone()
        }
    }

    /// Applies an edit. Only content, `edited` and `edited_at` change.
    pub fn apply(&mut self, patch: &MessagePatch) {
        self.content = patch.content.clone();
        self.edited = true;
        self.edited_at = Some(patch.edited_at);
    }
}

/// The fields an edit is allowed to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    pub content: Content,
    pub edited_at: DateTime<Utc>,
}

impl MessagePatch {
    pub fn new(content: impl Into<Content>, edited_at: DateTime<Utc>) -> Self {
        MessagePatch {
            content: content.into(),
            edited_at,
        }
    }
}

/// Finds `id` in `messages` and checks that `sender_id` authored it.
///
/// # Errors
///
/// [`Error::MessageNotFound`] if no message has that id, [`Error::NotAuthor`]
/// if it belongs to someone else.
pub fn find_authored<'a>(
    messages: &'a [Message],
    id: &MessageId,
    sender_id: &str,
) -> Result<&'a Message> {
    let message = messages
        .iter()
        .find(|m| &m.id == id)
        .ok_or_else(|| Error::MessageNotFound(id.to_string()))?;
    if message.sender_id != sender_id {
        return Err(Error::NotAuthor {
            message_id: id.to_string(),
            sender_id: sender_id.to_string(),
        });
    }
    Ok(message)
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
