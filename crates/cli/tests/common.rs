// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A `convo` command isolated from the caller's environment.
pub fn convo() -> Command {
    let mut cmd = cargo_bin_cmd!("convo");
    cmd.env_remove("CONVO_CONFIG")
        .env_remove("CONVO_USER")
        .env_remove("CONVO_CACHE");
    cmd
}

/// A temp directory holding a local-only config for `alice`.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn local(user: &str) -> Self {
        Self::with_remote(user, None)
    }

    pub fn with_remote(user: &str, url: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache.json");
        let mut config = format!("user = \"{}\"\ncache_path = {:?}\n", user, cache);
        if let Some(url) = url {
            config.push_str(&format!(
                "\n[remote]\nurl = \"{}\"\nconnect_timeout_secs = 1\n",
                url
            ));
        }
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Workspace { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.path().join("cache.json")
    }

    /// `convo --config <this workspace>`.
    pub fn convo(&self) -> Command {
        let mut cmd = convo();
        cmd.arg("--config").arg(self.config_path());
        cmd
    }

    /// Runs `convo send` and returns the id it printed.
    pub fn send(&self, to: &str, text: &str) -> String {
        let output = self.convo().arg("send").arg(to).arg(text).output().unwrap();
        assert!(output.status.success(), "send failed: {:?}", output);

        String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .nth(1)
            .unwrap()
            .to_string()
    }
}
