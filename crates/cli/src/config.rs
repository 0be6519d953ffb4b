// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Stored as TOML, by default in `<config dir>/convo/config.toml`:
//!
//! ```toml
//! user = "alice"
//! cache_path = "/home/alice/.local/share/convo/cache.json"
//!
//! [remote]
//! url = "ws://chat.example.com:7420"
//! connect_timeout_secs = 2
//! max_batch_size = 500
//! ```
//!
//! Without a `[remote]` table the client never leaves local-only mode.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cv_core::MAX_BATCH_WRITES;

use crate::env;
use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "convo";
const CONFIG_FILE_NAME: &str = "config.toml";
const CACHE_FILE_NAME: &str = "cache.json";

/// Client configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default sender id for commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Location of the local cache record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
    /// Remote store connection (optional - if absent, runs local-only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

/// Remote store connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL of a `cv-remote` server (`ws://...` or `wss://...`).
    pub url: String,
    /// Max time to wait for the connection in seconds (default: 2).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Largest batch sent while reconciling (default and ceiling: 500).
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_connect_timeout_secs() -> u64 {
    2
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_WRITES
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_batch_size: default_max_batch_size(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Checks the URL scheme and batch size.
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(Error::InvalidRemoteUrl(self.url.clone()));
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_WRITES {
            return Err(Error::InvalidBatchSize {
                actual: self.max_batch_size,
                max: MAX_BATCH_WRITES,
            });
        }
        Ok(())
    }
}

impl Config {
    /// Loads and validates the config at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigNotFound`] if the file does not exist, [`Error::Config`]
    /// if it cannot be read or parsed, and the [`RemoteConfig::validate`]
    /// errors for a bad `[remote]` table.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.display().to_string()));
            }
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if let Some(remote) = &config.remote {
            remote.validate()?;
        }
        Ok(config)
    }

    /// Loads the config from an explicit path, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields an empty,
    /// local-only config.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Returns the remote URL if configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.url.as_str())
    }

    /// Largest batch the sync engine may send.
    pub fn max_batch_size(&self) -> usize {
        self.remote
            .as_ref()
            .map_or(MAX_BATCH_WRITES, |r| r.max_batch_size)
    }

    /// Resolves the acting user: `--user`, then `CONVO_USER`, then `user`.
    pub fn resolve_user(&self, flag: Option<&str>) -> Result<String> {
        pick_user(flag, env::user(), self.user.as_deref()).ok_or(Error::UserRequired)
    }

    /// Resolves the cache location: `CONVO_CACHE`, then `cache_path`, then
    /// `<data dir>/convo/cache.json`.
    pub fn resolve_cache_path(&self) -> Result<PathBuf> {
        env::cache_path()
            .or_else(|| self.cache_path.clone())
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME).join(CACHE_FILE_NAME)))
            .ok_or_else(|| {
                Error::Config("no data directory found\n  hint: set cache_path".to_string())
            })
    }
}

/// Returns `CONVO_CONFIG` if set, else `<config dir>/convo/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    env::config_path()
        .or_else(|| dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)))
}

/// First non-blank candidate in precedence order.
fn pick_user(flag: Option<&str>, env: Option<String>, file: Option<&str>) -> Option<String> {
    let non_blank = |s: &str| !s.trim().is_empty();
    flag.filter(|s| non_blank(s))
        .map(str::to_string)
        .or(env.filter(|s| non_blank(s)))
        .or_else(|| file.filter(|s| non_blank(s)).map(str::to_string))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
