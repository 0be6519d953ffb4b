// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::cache::CacheError;
use crate::remote::RemoteError;

/// All possible errors that can occur in the convo library.
///
/// Manager operations absorb remote and cache failures, so these mostly
/// surface from configuration loading and the command-line front end.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found at {0}\n  hint: create it or pass --config <path>")]
    ConfigNotFound(String),

    #[error("invalid remote URL '{0}': must start with ws:// or wss://")]
    InvalidRemoteUrl(String),

    #[error("no user configured\n  hint: set `user` in the config file, CONVO_USER, or pass --user")]
    UserRequired,

    #[error("max_batch_size must be between 1 and {max}, got {actual}")]
    InvalidBatchSize { actual: usize, max: usize },

    #[error("message '{0}' does not exist or was not sent by you")]
    NotYours(String),

    #[error("live updates need a reachable remote store\n  hint: check `convo status`")]
    RemoteRequired,

    #[error("reconciliation incomplete: {0}")]
    SyncIncomplete(String),

    #[error("{0}")]
    Core(#[from] cv_core::Error),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for convo operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
