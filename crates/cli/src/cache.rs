// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local cache of conversations.
//!
//! The cache is the only store that is always available. It keeps every
//! conversation's ordered message list in memory and mirrors the whole map to
//! a single JSON record on disk after each mutation. A failed disk write is
//! reported to the caller but never rolls back the in-memory state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use cv_core::{ConversationKey, Message, MessageId};

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<cv_core::Error> for CacheError {
    fn from(e: cv_core::Error) -> Self {
        match e {
            cv_core::Error::Io(e) => CacheError::Io(e),
            cv_core::Error::Json(e) => CacheError::Serialization(e),
            other => CacheError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Durable, always-available message storage keyed by conversation.
///
/// Reads never fail. Mutations update the in-memory view first and then
/// persist; a persistence failure is returned but the mutation stands.
pub trait LocalCache: Send + Sync {
    /// Returns the ordered messages of a conversation (empty if unknown).
    fn load(&self, key: &ConversationKey) -> Vec<Message>;

    /// Returns every conversation with cached content.
    fn conversations(&self) -> Vec<ConversationKey>;

    /// Appends a message. Appending an id that is already present is a no-op.
    fn append(&self, key: &ConversationKey, message: Message) -> CacheResult<()>;

    /// Overwrites a conversation with the given list.
    fn replace_all(&self, key: &ConversationKey, messages: Vec<Message>) -> CacheResult<()>;

    /// Mutates a message in place. Returns false if the id is absent.
    fn update(
        &self,
        key: &ConversationKey,
        id: &MessageId,
        mutate: &dyn Fn(&mut Message),
    ) -> CacheResult<bool>;

    /// Removes a message. Returns false if the id is absent.
    fn remove(&self, key: &ConversationKey, id: &MessageId) -> CacheResult<bool>;

    /// Looks up a single message.
    fn find(&self, key: &ConversationKey, id: &MessageId) -> Option<Message> {
        self.load(key).into_iter().find(|m| &m.id == id)
    }
}

type Conversations = BTreeMap<ConversationKey, Vec<Message>>;

/// [`LocalCache`] backed by a single JSON file.
pub struct FileCache {
    /// Path to the record. `None` keeps the cache purely in memory.
    path: Option<PathBuf>,
    conversations: Mutex<Conversations>,
}

impl FileCache {
    /// Opens the cache at `path`, loading any existing record.
    ///
    /// A missing file yields an empty cache; the file is created on the first
    /// mutation.
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conversations: Conversations = cv_core::record::read(path)?.unwrap_or_default();
        tracing::debug!(
            "opened cache {} with {} conversations",
            path.display(),
            conversations.len()
        );
        Ok(FileCache {
            path: Some(path.to_path_buf()),
            conversations: Mutex::new(conversations),
        })
    }

    /// Creates a cache that never touches disk.
    pub fn in_memory() -> Self {
        FileCache {
            path: None,
            conversations: Mutex::new(Conversations::new()),
        }
    }

    /// Path of the backing record, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Conversations> {
        self.conversations.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persists the whole map. Called with the lock held so writes never interleave.
    fn persist(&self, conversations: &Conversations) -> CacheResult<()> {
        match &self.path {
            Some(path) => Ok(cv_core::record::write(path, conversations)?),
            None => Ok(()),
        }
    }
}

impl LocalCache for FileCache {
    fn load(&self, key: &ConversationKey) -> Vec<Message> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    fn conversations(&self) -> Vec<ConversationKey> {
        self.lock()
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn append(&self, key: &ConversationKey, message: Message) -> CacheResult<()> {
        let mut conversations = self.lock();
        let messages = conversations.entry(key.clone()).or_default();
        if messages.iter().any(|m| m.id == message.id) {
            return Ok(());
        }
        messages.push(message);
        self.persist(&conversations)
    }

    fn replace_all(&self, key: &ConversationKey, messages: Vec<Message>) -> CacheResult<()> {
        let mut conversations = self.lock();
        if messages.is_empty() {
            conversations.remove(key);
        } else {
            conversations.insert(key.clone(), messages);
        }
        self.persist(&conversations)
    }

    fn update(
        &self,
        key: &ConversationKey,
        id: &MessageId,
        mutate: &dyn Fn(&mut Message),
    ) -> CacheResult<bool> {
        let mut conversations = self.lock();
        let Some(message) = conversations
            .get_mut(key)
            .and_then(|messages| messages.iter_mut().find(|m| &m.id == id))
        else {
            return Ok(false);
        };
        mutate(message);
        self.persist(&conversations)?;
        Ok(true)
    }

    fn remove(&self, key: &ConversationKey, id: &MessageId) -> CacheResult<bool> {
        let mut conversations = self.lock();
        let Some(messages) = conversations.get_mut(key) else {
            return Ok(false);
        };
        let before = messages.len();
        messages.retain(|m| &m.id != id);
        if messages.len() == before {
            return Ok(false);
        }
        if messages.is_empty() {
            conversations.remove(key);
        }
        self.persist(&conversations)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
