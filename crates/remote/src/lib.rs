// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cv-remote: WebSocket document store server for convo clients.
//!
//! Holds the canonical conversations, answers CRUD and batch requests, and
//! pushes a fresh snapshot to every subscription whose conversation changed.

pub mod server;
pub mod state;

pub use server::{run, serve};
pub use state::ServerState;
