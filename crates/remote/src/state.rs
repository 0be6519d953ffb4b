// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the canonical document store for shared access, persists it after
//! every mutation, and announces which conversations changed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use cv_core::{
    record, BatchWrite, Clock, ConversationKey, DocumentStore, Message, MessageId, MessagePatch,
    Result, SystemClock,
};

/// File holding the persisted document store inside the data directory.
pub const STORE_FILE_NAME: &str = "conversations.json";

/// Shared server state containing the canonical document store.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// The canonical store (protected by mutex for writes).
    store: Mutex<DocumentStore>,
    /// Where the store is persisted; `None` keeps it in memory only.
    path: Option<PathBuf>,
    /// Source of server creation times.
    clock: Arc<dyn Clock>,
    /// Broadcast channel announcing changed conversations.
    broadcast_tx: broadcast::Sender<ConversationKey>,
    /// Subscription ids are unique across all connections.
    next_subscription: AtomicU64,
}

impl ServerState {
    /// Creates server state persisted in `data_dir`, loading any existing store.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(STORE_FILE_NAME);
        let store: DocumentStore = record::read(&path)?.unwrap_or_default();
        info!(
            "Loaded {} message(s) in {} conversation(s)",
            store.len(),
            store.conversations().len()
        );
        Ok(Self::build(store, Some(path), Arc::new(SystemClock)))
    }

    /// Creates empty server state that is never written to disk.
    pub fn in_memory() -> Self {
        Self::build(DocumentStore::new(), None, Arc::new(SystemClock))
    }

    /// Creates empty in-memory state stamping creation times from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::build(DocumentStore::new(), None, clock)
    }

    fn build(store: DocumentStore, path: Option<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        // Create broadcast channel with reasonable buffer
        let (broadcast_tx, _) = broadcast::channel(1024);
        ServerState {
            inner: Arc::new(ServerStateInner {
                store: Mutex::new(store),
                path,
                clock,
                broadcast_tx,
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    fn persist(&self, store: &DocumentStore) -> Result<()> {
        match &self.inner.path {
            Some(path) => record::write(path, store),
            None => Ok(()),
        }
    }

    fn announce(&self, key: ConversationKey) {
        // No receivers just means nobody is connected.
        let _ = self.inner.broadcast_tx.send(key);
    }

    /// Applies `change` to a copy of the store and keeps the copy only once
    /// it has been persisted, so a failed write leaves no trace.
    async fn commit<T>(&self, change: impl FnOnce(&mut DocumentStore) -> Result<T>) -> Result<T> {
        let mut store = self.inner.store.lock().await;
        let mut next = store.clone();
        let value = change(&mut next)?;
        self.persist(&next)?;
        *store = next;
        Ok(value)
    }

    /// Records a connectivity probe.
    pub async fn probe(&self) -> Result<()> {
        let clock = self.inner.clock.as_ref();
        self.commit(|store| {
            store.probe(clock);
            Ok(())
        })
        .await
    }

    /// Stores a message and returns its new id.
    pub async fn add(&self, key: &ConversationKey, message: &Message) -> Result<MessageId> {
        let clock = self.inner.clock.as_ref();
        let id = self
            .commit(|store| Ok(store.add(key, message, clock)))
            .await?;
        self.announce(key.clone());
        Ok(id)
    }

    /// Returns a conversation ordered by creation.
    pub async fn messages(&self, key: &ConversationKey) -> Vec<Message> {
        self.inner.store.lock().await.messages(key)
    }

    pub async fn update(
        &self,
        key: &ConversationKey,
        id: &MessageId,
        patch: &MessagePatch,
    ) -> Result<()> {
        self.commit(|store| store.update(key, id, patch)).await?;
        self.announce(key.clone());
        Ok(())
    }

    pub async fn delete(&self, key: &ConversationKey, id: &MessageId) -> Result<()> {
        self.commit(|store| store.delete(key, id)).await?;
        self.announce(key.clone());
        Ok(())
    }

    /// Applies a batch atomically and returns the number of messages written.
    pub async fn batch_write(&self, writes: &[BatchWrite]) -> Result<usize> {
        let clock = self.inner.clock.as_ref();
        let touched = self
            .commit(|store| store.batch_write(writes, clock))
            .await?;
        for key in touched {
            self.announce(key);
        }
        Ok(writes.len())
    }

    /// Allocates a subscription id.
    pub fn next_subscription_id(&self) -> u64 {
        self.inner.next_subscription.fetch_add(1, Ordering::Relaxed)
    }

    /// Subscribe to change announcements.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationKey> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Total number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.inner.store.lock().await.len()
    }
}
