// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel listeners and their cancellation handle.
//!
//! Delivery and cancellation take the same lock, so once
//! [`Subscription::unsubscribe`] returns the listener can never run again,
//! even if an event was already on its way from the store.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use cv_core::Message;

/// What a push channel delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The full ordered conversation after a change.
    Snapshot(Vec<Message>),
    /// The channel broke. Carries the last list seen before the break.
    ChannelLost(Vec<Message>),
}

/// Callback invoked for every [`ChangeEvent`].
pub type ChangeListener = Box<dyn FnMut(ChangeEvent) + Send>;

/// Holds a listener until it is closed.
pub struct ListenerSlot {
    listener: Mutex<Option<ChangeListener>>,
}

impl ListenerSlot {
    pub fn new(listener: ChangeListener) -> Arc<Self> {
        Arc::new(ListenerSlot {
            listener: Mutex::new(Some(listener)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<ChangeListener>> {
        self.listener.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Invokes the listener if the slot is still open.
    ///
    /// Returns false if the slot was closed and the event was dropped.
    pub fn deliver(&self, event: ChangeEvent) -> bool {
        let mut listener = self.lock();
        match listener.as_mut() {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }

    /// Drops the listener. Blocks while a delivery is in progress.
    ///
    /// Must not be called from inside the listener itself.
    pub fn close(&self) {
        self.lock().take();
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }
}

impl fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Handle to an open push channel.
///
/// Dropping the handle unsubscribes as well. Neither may happen inside the
/// listener of the same subscription: the listener runs with the slot locked,
/// so unsubscribing from it deadlocks.
pub struct Subscription {
    slot: Option<Arc<ListenerSlot>>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a handle over `slot`. `release` frees store-side resources and
    /// runs once, after the slot is closed.
    pub fn new(slot: Arc<ListenerSlot>, release: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            slot: Some(slot),
            release: Some(Box::new(release)),
        }
    }

    /// A handle that was never connected to anything.
    pub fn inert() -> Self {
        Subscription {
            slot: None,
            release: None,
        }
    }

    /// Returns true while the listener can still be invoked.
    pub fn is_active(&self) -> bool {
        self.slot.as_ref().is_some_and(|slot| slot.is_open())
    }

    /// Stops delivery. No listener invocation happens after this returns.
    ///
    /// Blocks while the listener is running, so it must not be called (or the
    /// handle dropped) from inside that listener.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.close();
        }
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
