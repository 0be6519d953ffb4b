// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation manager: the caller-facing API.
//!
//! Every operation addresses the remote store while it is reachable and the
//! local cache otherwise. A failed remote call switches the process to
//! [`StoreState::LocalOnly`] and the operation completes against the cache.
//! Only an explicit probe (or `reconcile`) switches back, and switching back
//! never pushes cached messages on its own.

use std::sync::Arc;

use cv_core::{
    find_authored, Clock, Content, ConversationKey, Message, MessageId, MessagePatch, SystemClock,
    MAX_BATCH_WRITES,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::{CacheResult, LocalCache};
use crate::connectivity::{ConnectivityMonitor, StoreState};
use crate::error::Result;
use crate::remote::{
    ChangeEvent, ChangeListener, RemoteError, RemoteResult, RemoteStore, Subscription,
};
use crate::sync::{SyncEngine, SyncReport};

/// Tunables for a [`ConversationManager`].
#[derive(Clone)]
pub struct ManagerOptions {
    /// Source of message timestamps, `editedAt` values and local ids.
    pub clock: Arc<dyn Clock>,
    /// Largest batch the sync engine sends.
    pub max_batch: usize,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        ManagerOptions {
            clock: Arc::new(SystemClock),
            max_batch: MAX_BATCH_WRITES,
        }
    }
}

enum Change {
    Edit(MessagePatch),
    Delete,
}

/// Sends, reads, edits and deletes direct messages over a remote store with
/// a local cache fallback.
pub struct ConversationManager<R: ?Sized, C: ?Sized> {
    remote: Arc<R>,
    cache: Arc<C>,
    monitor: Arc<ConnectivityMonitor<R>>,
    sync: SyncEngine<R, C>,
    clock: Arc<dyn Clock>,
}

impl<R, C> ConversationManager<R, C>
where
    R: RemoteStore + ?Sized + 'static,
    C: LocalCache + ?Sized + 'static,
{
    /// Creates a manager in [`StoreState::LocalOnly`] without probing.
    pub fn new(remote: Arc<R>, cache: Arc<C>, options: ManagerOptions) -> Self {
        let monitor = Arc::new(ConnectivityMonitor::new(Arc::clone(&remote)));
        let sync =
            SyncEngine::with_batch_size(Arc::clone(&remote), Arc::clone(&cache), options.max_batch);
        ConversationManager {
            remote,
            cache,
            monitor,
            sync,
            clock: options.clock,
        }
    }

    /// Creates a manager and probes the remote to pick the initial state.
    pub async fn start(remote: Arc<R>, cache: Arc<C>, options: ManagerOptions) -> Self {
        let manager = Self::new(remote, cache, options);
        manager.monitor.check().await;
        manager
    }

    /// Sends a message from `sender` to `receiver`.
    ///
    /// While the remote is reachable the stored message carries the id the
    /// remote assigned. Otherwise it carries a locally generated id and is
    /// pushed by the next [`reconcile`](Self::reconcile).
    pub async fn send(
        &self,
        sender: &str,
        receiver: &str,
        content: impl Into<Content>,
    ) -> Result<Message> {
        let key = ConversationKey::between(sender, receiver)?;
        let now = self.clock.now();
        let draft = Message::new(MessageId::local(now), sender, content, now);

        if self.monitor.is_available() {
            match self.remote.add_message(key.clone(), draft.clone()).await {
                Ok(id) => {
                    let message = draft.with_id(id);
                    self.log_cache_failure(self.cache.append(&key, message.clone()));
                    return Ok(message);
                }
                Err(e) => self.remote_failed(&e),
            }
        }

        debug!(conversation = %key, id = %draft.id, "storing message locally");
        self.log_cache_failure(self.cache.append(&key, draft.clone()));
        Ok(draft)
    }

    /// Returns the conversation between `a` and `b`.
    ///
    /// A successful remote fetch also overwrites the cached copy.
    pub async fn get_messages(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let key = ConversationKey::between(a, b)?;

        if self.monitor.is_available() {
            match self.remote.get_messages(key.clone()).await {
                Ok(messages) => {
                    self.log_cache_failure(self.cache.replace_all(&key, messages.clone()));
                    return Ok(messages);
                }
                Err(e) => self.remote_failed(&e),
            }
        }

        Ok(self.cache.load(&key))
    }

    /// Replaces the content of a message authored by `sender`.
    ///
    /// Returns false if the message does not exist or belongs to someone else.
    pub async fn edit_message(
        &self,
        sender: &str,
        receiver: &str,
        id: &MessageId,
        content: impl Into<Content>,
    ) -> Result<bool> {
        let key = ConversationKey::between(sender, receiver)?;
        let patch = MessagePatch::new(content, self.clock.now());
        Ok(self.mutate(&key, id, sender, Change::Edit(patch)).await)
    }

    /// Deletes a message authored by `sender`.
    ///
    /// Returns false if the message does not exist or belongs to someone else.
    pub async fn delete_message(
        &self,
        sender: &str,
        receiver: &str,
        id: &MessageId,
    ) -> Result<bool> {
        let key = ConversationKey::between(sender, receiver)?;
        Ok(self.mutate(&key, id, sender, Change::Delete).await)
    }

    /// Watches the conversation between `a` and `b`.
    ///
    /// `on_change` receives the full ordered list right away and after every
    /// change; each list is written to the cache first. If the push channel
    /// breaks, the manager switches to local-only and `on_change` receives the
    /// last list once more; subscribe again after a successful probe.
    ///
    /// Without a reachable remote this returns an inert subscription.
    /// `on_change` must not drop or unsubscribe the returned handle.
    pub async fn subscribe<F>(&self, a: &str, b: &str, on_change: F) -> Result<Subscription>
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        let key = ConversationKey::between(a, b)?;
        if !self.monitor.is_available() {
            warn!(conversation = %key, "live updates need the remote store, not subscribing");
            return Ok(Subscription::inert());
        }

        let listener = self.listener(key.clone(), on_change);
        match self.remote.subscribe(key, listener).await {
            Ok(subscription) => Ok(subscription),
            Err(e) => {
                self.remote_failed(&e);
                Ok(Subscription::inert())
            }
        }
    }

    /// Probes the remote and, if it is reachable, pushes cached messages it lacks.
    pub async fn reconcile(&self) -> SyncReport {
        if !self.monitor.check().await {
            debug!("remote unreachable, skipping reconciliation");
            return SyncReport::unreachable();
        }
        let report = self.sync.run().await;
        if !report.success {
            self.monitor.mark_local_only("reconciliation incomplete");
        }
        report
    }

    /// Probes the remote and returns the resulting state.
    pub async fn probe(&self) -> StoreState {
        self.monitor.check().await;
        self.monitor.state()
    }

    pub fn state(&self) -> StoreState {
        self.monitor.state()
    }

    /// Returns a receiver notified on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<StoreState> {
        self.monitor.watch()
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    fn listener<F>(&self, key: ConversationKey, mut on_change: F) -> ChangeListener
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let monitor = Arc::clone(&self.monitor);
        Box::new(move |event| match event {
            ChangeEvent::Snapshot(messages) => {
                if let Err(e) = cache.replace_all(&key, messages.clone()) {
                    warn!(conversation = %key, error = %e, "failed to persist snapshot");
                }
                on_change(messages);
            }
            ChangeEvent::ChannelLost(last) => {
                monitor.mark_local_only("subscription channel lost");
                on_change(last);
            }
        })
    }

    async fn mutate(
        &self,
        key: &ConversationKey,
        id: &MessageId,
        sender: &str,
        change: Change,
    ) -> bool {
        if self.monitor.is_available() {
            match self.mutate_remote(key, id, sender, &change).await {
                Ok(false) => return false,
                Ok(true) => {
                    // A no-op if the cache has not fetched this message yet.
                    self.log_cache_failure(self.apply_to_cache(key, id, &change));
                    return true;
                }
                Err(e) => self.remote_failed(&e),
            }
        }

        if let Err(e) = find_authored(&self.cache.load(key), id, sender) {
            debug!(conversation = %key, error = %e, "refusing local change");
            return false;
        }
        match self.apply_to_cache(key, id, &change) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(conversation = %key, error = %e, "cache write failed");
                true
            }
        }
    }

    /// Checks authorship against the remote copy, then applies the change there.
    async fn mutate_remote(
        &self,
        key: &ConversationKey,
        id: &MessageId,
        sender: &str,
        change: &Change,
    ) -> RemoteResult<bool> {
        let messages = self.remote.get_messages(key.clone()).await?;
        if let Err(e) = find_authored(&messages, id, sender) {
            debug!(conversation = %key, error = %e, "refusing remote change");
            return Ok(false);
        }

        let result = match change {
            Change::Edit(patch) => {
                self.remote
                    .update_message(key.clone(), id.clone(), patch.clone())
                    .await
            }
            Change::Delete => self.remote.delete_message(key.clone(), id.clone()).await,
        };
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.is_unavailable() => Err(e),
            Err(_) => Ok(false),
        }
    }

    fn apply_to_cache(
        &self,
        key: &ConversationKey,
        id: &MessageId,
        change: &Change,
    ) -> CacheResult<bool> {
        match change {
            Change::Edit(patch) => self.cache.update(key, id, &|m: &mut Message| m.apply(patch)),
            Change::Delete => self.cache.remove(key, id),
        }
    }

    fn remote_failed(&self, error: &RemoteError) {
        self.monitor.mark_local_only(&error.to_string());
    }

    fn log_cache_failure<T>(&self, result: CacheResult<T>) {
        if let Err(e) = result {
            warn!(error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
