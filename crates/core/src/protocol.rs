// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is request/response with server push:
//! - Client sends numbered requests (CRUD, batch writes, subscriptions)
//! - Server answers each request with `ok` or `error` carrying the same id
//! - Server pushes `snapshot` frames for every open subscription whenever the
//!   subscribed conversation changes

use serde::{Deserialize, Serialize};

use crate::message::{ConversationKey, Message, MessageId, MessagePatch};

/// A single write inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchWrite {
    pub conversation: ConversationKey,
    pub message: Message,
}

impl BatchWrite {
    pub fn new(conversation: ConversationKey, message: Message) -> Self {
        BatchWrite {
            conversation,
            message,
        }
    }
}

/// Operations a client can request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Throwaway write used to classify reachability.
    Probe,

    /// Store a new message. The server assigns its id.
    AddMessage {
        conversation: ConversationKey,
        message: Message,
    },

    /// Fetch a conversation, ordered by server creation time.
    GetMessages { conversation: ConversationKey },

    /// Apply an edit to an existing message.
    UpdateMessage {
        conversation: ConversationKey,
        message_id: MessageId,
        patch: MessagePatch,
    },

    DeleteMessage {
        conversation: ConversationKey,
        message_id: MessageId,
    },

    /// Store several messages atomically.
    BatchWrite { writes: Vec<BatchWrite> },

    /// Open a push channel for a conversation.
    ///
    /// The server replies with a subscription id and then sends an initial
    /// snapshot followed by one snapshot per change.
    Subscribe { conversation: ConversationKey },

    /// Close a push channel.
    Unsubscribe { subscription: u64 },
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientMessage {
    /// Client-chosen id echoed in the reply.
    pub id: u64,
    pub request: Request,
}

/// Successful reply payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Probed,
    Added { message_id: MessageId },
    Messages { messages: Vec<Message> },
    Updated,
    Deleted,
    Committed { written: usize },
    Subscribed { subscription: u64 },
    Unsubscribed,
}

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    BatchTooLarge,
    InvalidRequest,
    Internal,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The request with this id succeeded.
    Ok { id: u64, body: Reply },

    /// The request failed. `id` is absent when the frame could not be parsed.
    Error {
        id: Option<u64>,
        kind: ErrorKind,
        message: String,
    },

    /// Full ordered content of a subscribed conversation.
    Snapshot {
        subscription: u64,
        conversation: ConversationKey,
        messages: Vec<Message>,
    },
}

impl ClientMessage {
    pub fn new(id: u64, request: Request) -> Self {
        ClientMessage { id, request }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Ok reply.
    pub fn ok(id: u64, body: Reply) -> Self {
        ServerMessage::Ok { id, body }
    }

    /// Creates an Error reply.
    pub fn error(id: Option<u64>, kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            id,
            kind,
            message: message.into(),
        }
    }

    /// Creates a Snapshot push.
    pub fn snapshot(subscription: u64, conversation: ConversationKey, messages: Vec<Message>) -> Self {
        ServerMessage::Snapshot {
            subscription,
            conversation,
            messages,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
