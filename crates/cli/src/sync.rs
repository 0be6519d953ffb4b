// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pushes locally-originated messages to the remote store.
//!
//! For every cached conversation the engine fetches the remote list, stages
//! each cached message whose client timestamp the remote does not have, and
//! commits the staged writes in bounded atomic batches. A failure aborts only
//! the conversation it happened in.

use std::collections::HashSet;
use std::sync::Arc;

use cv_core::{BatchWrite, ConversationKey, Message, MAX_BATCH_WRITES};
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::remote::{RemoteError, RemoteStore};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// True when every conversation was reconciled.
    pub success: bool,
    pub batches_committed: usize,
    pub messages_written: usize,
    /// Conversations left for the next pass.
    pub failed_conversations: Vec<ConversationKey>,
}

impl SyncReport {
    /// Report for a pass that never reached the remote.
    pub fn unreachable() -> Self {
        SyncReport::default()
    }
}

/// Selects the cached messages the remote does not have yet.
///
/// Messages are matched by client `timestamp`, so two distinct messages
/// created in the same millisecond are treated as one.
pub fn plan(key: &ConversationKey, remote: &[Message], local: &[Message]) -> Vec<BatchWrite> {
    let known: HashSet<_> = remote.iter().map(|m| m.timestamp).collect();
    local
        .iter()
        .filter(|m| !known.contains(&m.timestamp))
        .map(|m| BatchWrite::new(key.clone(), m.clone()))
        .collect()
}

/// Reconciles the local cache into the remote store.
pub struct SyncEngine<R: ?Sized, C: ?Sized> {
    remote: Arc<R>,
    cache: Arc<C>,
    max_batch: usize,
}

impl<R, C> SyncEngine<R, C>
where
    R: RemoteStore + ?Sized,
    C: LocalCache + ?Sized,
{
    pub fn new(remote: Arc<R>, cache: Arc<C>) -> Self {
        Self::with_batch_size(remote, cache, MAX_BATCH_WRITES)
    }

    /// Uses batches of at most `max_batch` writes, clamped to `1..=MAX_BATCH_WRITES`.
    pub fn with_batch_size(remote: Arc<R>, cache: Arc<C>, max_batch: usize) -> Self {
        SyncEngine {
            remote,
            cache,
            max_batch: max_batch.clamp(1, MAX_BATCH_WRITES),
        }
    }

    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Runs one pass over every cached conversation.
    ///
    /// The cache is left as is; ids of pushed messages are refreshed the next
    /// time the conversation is fetched.
    pub async fn run(&self) -> SyncReport {
        let mut report = SyncReport::default();

        for key in self.cache.conversations() {
            match self.sync_conversation(&key).await {
                Ok((batches, written)) => {
                    report.batches_committed += batches;
                    report.messages_written += written;
                }
                Err((batches, written, e)) => {
                    warn!(conversation = %key, error = %e, "reconciliation failed");
                    report.batches_committed += batches;
                    report.messages_written += written;
                    report.failed_conversations.push(key);
                }
            }
        }

        report.success = report.failed_conversations.is_empty();
        info!(
            batches = report.batches_committed,
            written = report.messages_written,
            failed = report.failed_conversations.len(),
            "reconciliation finished"
        );
        report
    }

    /// Returns committed batches and messages, including the partial counts on failure.
    async fn sync_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<(usize, usize), (usize, usize, RemoteError)> {
        let remote = self
            .remote
            .get_messages(key.clone())
            .await
            .map_err(|e| (0, 0, e))?;
        let staged = plan(key, &remote, &self.cache.load(key));
        debug!(conversation = %key, staged = staged.len(), "staged local messages");

        let mut batches = 0;
        let mut written = 0;
        for chunk in staged.chunks(self.max_batch) {
            match self.remote.batch_write(chunk.to_vec()).await {
                Ok(n) => {
                    batches += 1;
                    written += n;
                }
                Err(e) => return Err((batches, written, e)),
            }
        }
        Ok((batches, written))
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
