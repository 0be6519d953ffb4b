// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote reachability and the process-wide store state.
//!
//! The state is refreshed only when something asks: an explicit probe, or a
//! remote call that fails. There is no background timer.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::remote::RemoteStore;

/// Which backend the manager addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Remote is authoritative; the cache mirrors it.
    RemoteAvailable,
    /// Remote is unreachable; the cache is authoritative.
    LocalOnly,
}

impl StoreState {
    pub fn is_available(&self) -> bool {
        *self == StoreState::RemoteAvailable
    }
}

impl std::fmt::Display for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreState::RemoteAvailable => write!(f, "remote-available"),
            StoreState::LocalOnly => write!(f, "local-only"),
        }
    }
}

/// Probes the remote and owns the last-known [`StoreState`].
pub struct ConnectivityMonitor<R: ?Sized> {
    remote: Arc<R>,
    state: watch::Sender<StoreState>,
}

impl<R: RemoteStore + ?Sized> ConnectivityMonitor<R> {
    /// Creates a monitor that assumes the remote is unreachable until probed.
    pub fn new(remote: Arc<R>) -> Self {
        let (state, _) = watch::channel(StoreState::LocalOnly);
        ConnectivityMonitor { remote, state }
    }

    /// Probes the remote once and records the outcome. Never fails.
    pub async fn check(&self) -> bool {
        match self.remote.probe().await {
            Ok(()) => {
                self.transition(StoreState::RemoteAvailable);
                true
            }
            Err(e) => {
                debug!(error = %e, "probe failed");
                self.transition(StoreState::LocalOnly);
                false
            }
        }
    }

    /// Records that a remote call failed.
    pub fn mark_local_only(&self, reason: &str) {
        if self.state().is_available() {
            warn!(%reason, "remote call failed, falling back to local cache");
        }
        self.transition(StoreState::LocalOnly);
    }

    pub fn state(&self) -> StoreState {
        *self.state.borrow()
    }

    pub fn is_available(&self) -> bool {
        self.state().is_available()
    }

    /// Returns a receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    fn transition(&self, next: StoreState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            info!(state = %next, "store state changed");
        }
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
