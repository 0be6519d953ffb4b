// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical document store semantics.
//!
//! One collection of conversations, each holding a sub-collection of message
//! documents. The store assigns message ids, stamps a server creation time
//! and a monotonic sequence number, and always returns a conversation ordered
//! by creation. It is shared by the remote server and the in-process test
//! double so both behave identically.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::message::{ConversationKey, Message, MessageId, MessagePatch};
use crate::protocol::BatchWrite;

/// Maximum number of writes accepted in one atomic batch.
pub const MAX_BATCH_WRITES: usize = 500;

/// A stored message plus the server-side bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(flatten)]
    pub message: Message,
    pub created_at: DateTime<Utc>,
    pub seq: u64,
}

/// In-memory document store. Serializable so the server can persist it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStore {
    conversations: BTreeMap<ConversationKey, Vec<Document>>,
    next_seq: u64,
    /// Throwaway slot written by connectivity probes.
    #[serde(default)]
    last_probe: Option<DateTime<Utc>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a probe. The value is never read back by clients.
    pub fn probe(&mut self, clock: &dyn Clock) {
        self.last_probe = Some(clock.now());
    }

    /// Stores a message under a freshly assigned id and returns that id.
    ///
    /// Any id carried by `message` is discarded.
    pub fn add(&mut self, key: &ConversationKey, message: &Message, clock: &dyn Clock) -> MessageId {
        let id = MessageId::new(uuid::Uuid::new_v4().simple().to_string());
        let seq = self.next_seq;
        self.next_seq += 1;

        self.conversations
            .entry(key.clone())
            .or_default()
            .push(Document {
                message: message.with_id(id.clone()),
                created_at: clock.now(),
                seq,
            });
        id
    }

    /// Returns the conversation ordered by server creation (empty if unknown).
    pub fn messages(&self, key: &ConversationKey) -> Vec<Message> {
        self.conversations
            .get(key)
            .map(|docs| docs.iter().map(|d| d.message.clone()).collect())
            .unwrap_or_default()
    }

    /// Applies an edit to an existing message.
    pub fn update(&mut self, key: &ConversationKey, id: &MessageId, patch: &MessagePatch) -> Result<()> {
        let doc = self.document_mut(key, id)?;
        doc.message.apply(patch);
        Ok(())
    }

    /// Removes a message.
    pub fn delete(&mut self, key: &ConversationKey, id: &MessageId) -> Result<()> {
        let docs = self
            .conversations
            .get_mut(key)
            .ok_or_else(|| Error::MessageNotFound(id.to_string()))?;
        let index = docs
            .iter()
            .position(|d| &d.message.id == id)
            .ok_or_else(|| Error::MessageNotFound(id.to_string()))?;
        docs.remove(index);
        if docs.is_empty() {
            self.conversations.remove(key);
        }
        Ok(())
    }

    /// Stores every write or none of them.
    ///
    /// Returns the keys that changed, in first-touched order, so callers can
    /// notify subscribers once per conversation.
    ///
    /// # Errors
    ///
    /// [`Error::BatchTooLarge`] if more than [`MAX_BATCH_WRITES`] writes are given.
    pub fn batch_write(&mut self, writes: &[BatchWrite], clock: &dyn Clock) -> Result<Vec<ConversationKey>> {
        if writes.len() > MAX_BATCH_WRITES {
            return Err(Error::BatchTooLarge {
                actual: writes.len(),
                max: MAX_BATCH_WRITES,
            });
        }

        let mut touched: Vec<ConversationKey> = Vec::new();
        for write in writes {
            self.add(&write.conversation, &write.message, clock);
            if !touched.contains(&write.conversation) {
                touched.push(write.conversation.clone());
            }
        }
        Ok(touched)
    }

    /// Returns every conversation key with at least one message.
    pub fn conversations(&self) -> Vec<ConversationKey> {
        self.conversations.keys().cloned().collect()
    }

    /// Total number of stored messages across all conversations.
    pub fn len(&self) -> usize {
        self.conversations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn document_mut(&mut self, key: &ConversationKey, id: &MessageId) -> Result<&mut Document> {
        self.conversations
            .get_mut(key)
            .and_then(|docs| docs.iter_mut().find(|d| &d.message.id == id))
            .ok_or_else(|| Error::MessageNotFound(id.to_string()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
