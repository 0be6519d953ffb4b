// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cv-core operations.

use thiserror::Error;

/// All possible errors that can occur in cv-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("message {message_id} was not sent by {sender_id}\n  hint: only the author can edit or delete a message")]
    NotAuthor {
        message_id: String,
        sender_id: String,
    },

    #[error("invalid participant id: '{0}'\n  hint: participant ids cannot be empty or contain '_'")]
    InvalidParticipant(String),

    #[error("batch of {actual} writes exceeds the maximum of {max}")]
    BatchTooLarge { actual: usize, max: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for cv-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
