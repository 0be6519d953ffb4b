// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process remote store.
//!
//! Runs the same [`DocumentStore`] semantics as the server without any
//! network. Used as the test double for the manager and sync engine, with
//! switches to simulate outages, delayed notifications, and broken channels.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use cv_core::{
    BatchWrite, Clock, ConversationKey, DocumentStore, Message, MessageId, MessagePatch,
    SystemClock,
};

use super::subscription::{ChangeEvent, ChangeListener, ListenerSlot, Subscription};
use super::{RemoteError, RemoteFuture, RemoteResult, RemoteStore};

/// Number of calls that reached the store, per operation.
///
/// Calls rejected because the store is offline are not counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub probes: usize,
    pub adds: usize,
    pub gets: usize,
    pub updates: usize,
    pub deletes: usize,
    pub subscribes: usize,
    /// Successful `batch_write` calls.
    pub batches: usize,
    /// Messages written through `batch_write`.
    pub batch_writes: usize,
}

struct Subscriber {
    id: u64,
    key: ConversationKey,
    slot: Arc<ListenerSlot>,
    last: Vec<Message>,
}

#[derive(Default)]
struct Inner {
    store: DocumentStore,
    offline: bool,
    /// Remaining successful batch calls before batches start failing.
    batch_budget: Option<usize>,
    paused: bool,
    /// Deliveries captured while notifications were paused.
    held: Vec<(Arc<ListenerSlot>, Vec<Message>)>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
    calls: CallCounts,
}

/// [`RemoteStore`] backed by an in-memory [`DocumentStore`].
pub struct MemoryRemote {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Creates an empty, reachable store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty, reachable store stamping creation times from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MemoryRemote {
            inner: Arc::new(Mutex::new(Inner::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every subsequent call fail with [`RemoteError::Unavailable`] (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn is_offline(&self) -> bool {
        self.lock().offline
    }

    /// Lets the next `n` batch calls succeed and fails every batch call after them.
    pub fn fail_batches_after(&self, n: usize) {
        self.lock().batch_budget = Some(n);
    }

    /// Holds change notifications instead of delivering them.
    ///
    /// Each held notification already targets its listener, like an event
    /// that has left the server but not yet reached the client.
    pub fn pause_notifications(&self) {
        self.lock().paused = true;
    }

    /// Delivers every held notification and resumes immediate delivery.
    pub fn resume_notifications(&self) {
        let held = {
            let mut inner = self.lock();
            inner.paused = false;
            std::mem::take(&mut inner.held)
        };
        for (slot, messages) in held {
            slot.deliver(ChangeEvent::Snapshot(messages));
        }
    }

    /// Simulates a broken push channel.
    ///
    /// Every open listener receives [`ChangeEvent::ChannelLost`] with the last
    /// list it saw, all subscriptions are dropped, and the store goes offline.
    pub fn break_channels(&self) {
        let subscribers = {
            let mut inner = self.lock();
            inner.offline = true;
            std::mem::take(&mut inner.subscribers)
        };
        for subscriber in subscribers {
            subscriber
                .slot
                .deliver(ChangeEvent::ChannelLost(subscriber.last));
            subscriber.slot.close();
        }
    }

    /// Writes a message directly, bypassing availability checks and counters.
    ///
    /// Stands in for another client writing to the same conversation.
    pub fn seed(&self, key: &ConversationKey, message: &Message) -> MessageId {
        let id = self.lock().store.add(key, message, self.clock.as_ref());
        self.notify(key);
        id
    }

    /// Reads a conversation directly, bypassing availability checks and counters.
    pub fn snapshot(&self, key: &ConversationKey) -> Vec<Message> {
        self.lock().store.messages(key)
    }

    /// Total number of stored messages.
    pub fn message_count(&self) -> usize {
        self.lock().store.len()
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn check_online(&self) -> RemoteResult<MutexGuard<'_, Inner>> {
        let inner = self.lock();
        if inner.offline {
            return Err(RemoteError::Unavailable("memory remote is offline".to_string()));
        }
        Ok(inner)
    }

    /// Pushes the current list of `key` to its listeners, outside the store lock.
    fn notify(&self, key: &ConversationKey) {
        let deliveries: Vec<(Arc<ListenerSlot>, Vec<Message>)> = {
            let mut inner = self.lock();
            let messages = inner.store.messages(key);
            let mut targets = Vec::new();
            for subscriber in inner.subscribers.iter_mut().filter(|s| &s.key == key) {
                subscriber.last = messages.clone();
                targets.push((Arc::clone(&subscriber.slot), messages.clone()));
            }
            if inner.paused {
                inner.held.extend(targets);
                return;
            }
            targets
        };
        for (slot, messages) in deliveries {
            slot.deliver(ChangeEvent::Snapshot(messages));
        }
    }

    fn release(inner: &Weak<Mutex<Inner>>, id: u64) {
        if let Some(inner) = inner.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.subscribers.retain(|s| s.id != id);
        }
    }
}

impl RemoteStore for MemoryRemote {
    fn probe(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let mut inner = self.check_online()?;
            inner.calls.probes += 1;
            inner.store.probe(self.clock.as_ref());
            Ok(())
        })
    }

    fn add_message(&self, key: ConversationKey, message: Message) -> RemoteFuture<'_, MessageId> {
        Box::pin(async move {
            let id = {
                let mut inner = self.check_online()?;
                inner.calls.adds += 1;
                inner.store.add(&key, &message, self.clock.as_ref())
            };
            self.notify(&key);
            Ok(id)
        })
    }

    fn get_messages(&self, key: ConversationKey) -> RemoteFuture<'_, Vec<Message>> {
        Box::pin(async move {
            let mut inner = self.check_online()?;
            inner.calls.gets += 1;
            Ok(inner.store.messages(&key))
        })
    }

    fn update_message(
        &self,
        key: ConversationKey,
        id: MessageId,
        patch: MessagePatch,
    ) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            {
                let mut inner = self.check_online()?;
                inner.calls.updates += 1;
                inner
                    .store
                    .update(&key, &id, &patch)
                    .map_err(|e| RemoteError::NotFound(e.to_string()))?;
            }
            self.notify(&key);
            Ok(())
        })
    }

    fn delete_message(&self, key: ConversationKey, id: MessageId) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            {
                let mut inner = self.check_online()?;
                inner.calls.deletes += 1;
                inner
                    .store
                    .delete(&key, &id)
                    .map_err(|e| RemoteError::NotFound(e.to_string()))?;
            }
            self.notify(&key);
            Ok(())
        })
    }

    fn subscribe(
        &self,
        key: ConversationKey,
        listener: ChangeListener,
    ) -> RemoteFuture<'_, Subscription> {
        Box::pin(async move {
            let slot = ListenerSlot::new(listener);
            let (id, initial) = {
                let mut inner = self.check_online()?;
                inner.calls.subscribes += 1;
                let id = inner.next_subscription;
                inner.next_subscription += 1;
                let initial = inner.store.messages(&key);
                inner.subscribers.push(Subscriber {
                    id,
                    key,
                    slot: Arc::clone(&slot),
                    last: initial.clone(),
                });
                (id, initial)
            };
            slot.deliver(ChangeEvent::Snapshot(initial));

            let inner = Arc::downgrade(&self.inner);
            Ok(Subscription::new(slot, move || Self::release(&inner, id)))
        })
    }

    fn batch_write(&self, writes: Vec<BatchWrite>) -> RemoteFuture<'_, usize> {
        Box::pin(async move {
            let touched = {
                let mut inner = self.check_online()?;
                if let Some(budget) = inner.batch_budget {
                    if budget == 0 {
                        return Err(RemoteError::Unavailable(
                            "memory remote dropped the batch".to_string(),
                        ));
                    }
                    inner.batch_budget = Some(budget - 1);
                }
                let touched = inner
                    .store
                    .batch_write(&writes, self.clock.as_ref())
                    .map_err(|e| RemoteError::Rejected(e.to_string()))?;
                inner.calls.batches += 1;
                inner.calls.batch_writes += writes.len();
                touched
            };
            for key in &touched {
                self.notify(key);
            }
            Ok(writes.len())
        })
    }
}
