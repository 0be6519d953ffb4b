// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "convo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Direct messages that keep working when the server does not")]
#[command(
    long_about = "Direct messages backed by a remote document store with a local cache.\n\n\
    When the remote is unreachable every command runs against the cache; `convo sync` \
    pushes locally written messages once it is back."
)]
pub struct Cli {
    /// Config file (default: <config dir>/convo/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Act as this user instead of the configured one
    #[arg(short, long, global = true, value_name = "id", value_parser = non_empty_string)]
    pub user: Option<String>,

    /// Log remote traffic and state changes to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a message
    Send {
        /// Recipient id
        #[arg(value_parser = non_empty_string)]
        to: String,
        /// Message text
        #[arg(value_parser = non_empty_string)]
        text: String,
    },

    /// Show the conversation with someone
    History {
        /// Other participant
        #[arg(value_parser = non_empty_string)]
        with: String,
        /// Print messages as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the text of one of your messages
    Edit {
        /// Other participant
        #[arg(value_parser = non_empty_string)]
        with: String,
        /// Message id
        id: String,
        /// New text
        #[arg(value_parser = non_empty_string)]
        text: String,
    },

    /// Delete one of your messages
    Delete {
        /// Other participant
        #[arg(value_parser = non_empty_string)]
        with: String,
        /// Message id
        id: String,
    },

    /// Print the conversation on every change until interrupted
    Watch {
        /// Other participant
        #[arg(value_parser = non_empty_string)]
        with: String,
    },

    /// Push messages written while offline to the remote
    Sync,

    /// Probe the remote and show the store state
    Status,

    /// Print the conversation key for two participants
    Key {
        #[arg(value_parser = non_empty_string)]
        a: String,
        #[arg(value_parser = non_empty_string)]
        b: String,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
