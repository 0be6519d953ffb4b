// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! convo - direct messages over a remote document store with a local cache.
//!
//! # Main Components
//!
//! - [`ConversationManager`] - the caller-facing API (send, read, edit, delete, watch, reconcile)
//! - [`RemoteStore`] - the remote document store boundary, with [`WebSocketRemote`]
//!   for the `cv-remote` server and [`MemoryRemote`] as an in-process double
//! - [`LocalCache`] - durable local copy of every conversation ([`FileCache`])
//! - [`ConnectivityMonitor`] - probes the remote and owns the [`StoreState`]
//! - [`SyncEngine`] - pushes messages written while offline
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use convo::{ConversationManager, FileCache, ManagerOptions, WebSocketRemote};
//!
//! let remote = Arc::new(WebSocketRemote::new("ws://localhost:7420", Duration::from_secs(2)));
//! let cache = Arc::new(FileCache::open(Path::new("cache.json"))?);
//! let manager = ConversationManager::start(remote, cache, ManagerOptions::default()).await;
//!
//! manager.send("alice", "bob", "hello").await?;
//! let report = manager.reconcile().await;
//! ```

mod cli;
mod commands;
mod display;
mod env;

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod manager;
pub mod remote;
pub mod sync;

pub use cache::{CacheError, FileCache, LocalCache};
pub use cli::{Cli, Command};
pub use config::{Config, RemoteConfig};
pub use connectivity::{ConnectivityMonitor, StoreState};
pub use error::{Error, Result};
pub use manager::{ConversationManager, ManagerOptions};
pub use remote::{
    ChangeEvent, MemoryRemote, RemoteError, RemoteStore, Subscription, Unconfigured,
    WebSocketRemote,
};
pub use sync::{SyncEngine, SyncReport};

use commands::Session;

/// Runs a parsed command line, writing command output to stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config,
        user,
        command,
        ..
    } = cli;
    let mut stdout = std::io::stdout();

    if let Command::Key { a, b } = &command {
        return commands::key::run(a, b, &mut stdout);
    }

    let session = Session::open(config.as_deref(), user).await?;
    match command {
        Command::Send { to, text } => commands::send::run(&session, &to, &text, &mut stdout).await,
        Command::History { with, json } => {
            commands::history::run(&session, &with, json, &mut stdout).await
        }
        Command::Edit { with, id, text } => {
            commands::edit::run(&session, &with, &id, &text, &mut stdout).await
        }
        Command::Delete { with, id } => {
            commands::delete::run(&session, &with, &id, &mut stdout).await
        }
        Command::Watch { with } => {
            let interrupted = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            commands::watch::run(&session, &with, interrupted, std::io::stdout()).await
        }
        Command::Sync => commands::sync::run(&session, &mut stdout).await,
        Command::Status => commands::status::run(&session, &mut stdout).await,
        Command::Key { a, b } => commands::key::run(&a, &b, &mut stdout),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
