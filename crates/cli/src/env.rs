// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `CONVO_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var(vars::CONVO_CONFIG).ok().map(PathBuf::from)
}

/// Returns the value of `CONVO_USER` if set and non-empty.
pub fn user() -> Option<String> {
    std::env::var(vars::CONVO_USER)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Returns the value of `CONVO_CACHE` if set.
pub fn cache_path() -> Option<PathBuf> {
    std::env::var(vars::CONVO_CACHE).ok().map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
