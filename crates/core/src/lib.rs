// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cv-core: Shared library for the convo conversation store
//!
//! This crate provides the data model, wire protocol, and canonical document
//! store semantics used by both the convo client and the cv-remote server.

pub mod clock;
pub mod error;
pub mod message;
pub mod protocol;
pub mod record;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use message::{find_authored, Content, ConversationKey, Message, MessageId, MessagePatch};
pub use protocol::{BatchWrite, ClientMessage, ErrorKind, Reply, Request, ServerMessage};
pub use store::{Document, DocumentStore, MAX_BATCH_WRITES};
