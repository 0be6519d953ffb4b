// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod delete;
pub mod edit;
pub mod history;
pub mod key;
pub mod send;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use crate::cache::{FileCache, LocalCache};
use crate::config::Config;
use crate::error::Result;
use crate::manager::{ConversationManager, ManagerOptions};
use crate::remote::{RemoteStore, Unconfigured, WebSocketRemote};

/// Manager type used by the command-line front end.
pub type Manager = ConversationManager<dyn RemoteStore, dyn LocalCache>;

/// Everything a command needs: the loaded config, a started manager and the
/// `--user` override.
pub struct Session {
    pub config: Config,
    pub manager: Manager,
    user_flag: Option<String>,
}

impl Session {
    /// Loads the config, opens the cache and probes the remote.
    pub async fn open(config_path: Option<&Path>, user_flag: Option<String>) -> Result<Self> {
        let config = Config::discover(config_path)?;
        let cache_path = config.resolve_cache_path()?;
        let cache: Arc<dyn LocalCache> = Arc::new(FileCache::open(&cache_path)?);
        let options = ManagerOptions {
            max_batch: config.max_batch_size(),
            ..ManagerOptions::default()
        };
        let manager = ConversationManager::start(connect(&config), cache, options).await;
        Ok(Session::new(config, manager, user_flag))
    }

    pub fn new(config: Config, manager: Manager, user_flag: Option<String>) -> Self {
        Session {
            config,
            manager,
            user_flag,
        }
    }

    /// The acting user for this invocation.
    pub fn user(&self) -> Result<String> {
        self.config.resolve_user(self.user_flag.as_deref())
    }
}

/// Builds the remote adapter described by the config.
pub fn connect(config: &Config) -> Arc<dyn RemoteStore> {
    match &config.remote {
        Some(remote) => Arc::new(WebSocketRemote::new(
            remote.url.clone(),
            remote.connect_timeout(),
        )),
        None => Arc::new(Unconfigured),
    }
}
