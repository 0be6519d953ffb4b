// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote document store adapter.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌─────────────┐
//! │   Manager    │────►│  RemoteStore  │────►│  cv-remote  │
//! │              │◄────│    (trait)    │◄────│   server    │
//! └──────────────┘     └───────────────┘     └─────────────┘
//!                        │           │
//!              WebSocketRemote   MemoryRemote (in-process double)
//! ```
//!
//! The trait returns boxed futures so it stays object-safe and a manager can
//! hold an `Arc<dyn RemoteStore>` chosen at runtime.

mod memory;
mod subscription;
mod websocket;

use std::future::Future;
use std::pin::Pin;

use cv_core::{BatchWrite, ConversationKey, Message, MessageId, MessagePatch};

pub use memory::{CallCounts, MemoryRemote};
pub use subscription::{ChangeEvent, ChangeListener, ListenerSlot, Subscription};
pub use websocket::WebSocketRemote;

/// Error type for remote store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Network, permission, or quota failure reaching the store.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The addressed message does not exist remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store refused the request (e.g. an oversized batch).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The store answered with something the adapter did not expect.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RemoteError {
    /// Returns true for failures that should switch the client to local-only mode.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, RemoteError::NotFound(_))
    }
}

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by every [`RemoteStore`] operation.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// Operations against the durable remote document store.
///
/// Every conversation is a sub-collection of message documents ordered by
/// server creation time.
pub trait RemoteStore: Send + Sync {
    /// Performs a throwaway write to classify reachability.
    fn probe(&self) -> RemoteFuture<'_, ()>;

    /// Stores a message and returns the id the store assigned to it.
    fn add_message(&self, key: ConversationKey, message: Message) -> RemoteFuture<'_, MessageId>;

    /// Returns a conversation ordered by server creation.
    fn get_messages(&self, key: ConversationKey) -> RemoteFuture<'_, Vec<Message>>;

    /// Applies an edit. Fails with [`RemoteError::NotFound`] if the id is unknown.
    fn update_message(
        &self,
        key: ConversationKey,
        id: MessageId,
        patch: MessagePatch,
    ) -> RemoteFuture<'_, ()>;

    /// Deletes a message. Fails with [`RemoteError::NotFound`] if the id is unknown.
    fn delete_message(&self, key: ConversationKey, id: MessageId) -> RemoteFuture<'_, ()>;

    /// Opens a push channel for a conversation.
    ///
    /// The listener receives the full ordered list on every change. If the
    /// channel breaks, it receives [`ChangeEvent::ChannelLost`] with the last
    /// known list and is then dropped; the caller must re-subscribe.
    fn subscribe(
        &self,
        key: ConversationKey,
        listener: ChangeListener,
    ) -> RemoteFuture<'_, Subscription>;

    /// Stores up to [`cv_core::MAX_BATCH_WRITES`] messages atomically.
    ///
    /// Returns the number of messages written. Chunking larger sets is the
    /// caller's job.
    fn batch_write(&self, writes: Vec<BatchWrite>) -> RemoteFuture<'_, usize>;
}

/// Remote used when no remote store is configured. Every call is unavailable.
#[derive(Debug, Default)]
pub struct Unconfigured;

impl Unconfigured {
    fn unavailable<'a, T: Send + 'a>() -> RemoteFuture<'a, T> {
        Box::pin(async { Err(RemoteError::Unavailable("no remote configured".to_string())) })
    }
}

impl RemoteStore for Unconfigured {
    fn probe(&self) -> RemoteFuture<'_, ()> {
        Self::unavailable()
    }

    fn add_message(&self, _key: ConversationKey, _message: Message) -> RemoteFuture<'_, MessageId> {
        Self::unavailable()
    }

    fn get_messages(&self, _key: ConversationKey) -> RemoteFuture<'_, Vec<Message>> {
        Self::unavailable()
    }

    fn update_message(
        &self,
        _key: ConversationKey,
        _id: MessageId,
        _patch: MessagePatch,
    ) -> RemoteFuture<'_, ()> {
        Self::unavailable()
    }

    fn delete_message(&self, _key: ConversationKey, _id: MessageId) -> RemoteFuture<'_, ()> {
        Self::unavailable()
    }

    fn subscribe(
        &self,
        _key: ConversationKey,
        _listener: ChangeListener,
    ) -> RemoteFuture<'_, Subscription> {
        Self::unavailable()
    }

    fn batch_write(&self, _writes: Vec<BatchWrite>) -> RemoteFuture<'_, usize> {
        Self::unavailable()
    }
}
