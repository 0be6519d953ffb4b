// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::testing::{output, TestContext};

#[tokio::test]
async fn test_sync_pushes_offline_messages() {
    let ctx = TestContext::offline().await;
    ctx.session.manager.send("alice", "bob", "one").await.unwrap();
    ctx.session.manager.send("alice", "carol", "two").await.unwrap();
    ctx.remote.set_offline(false);
    let mut out = Vec::new();

    run(&ctx.session, &mut out).await.unwrap();

    assert_eq!(output(&out), "Synced 2 message(s) in 2 batch(es)\n");
    assert_eq!(ctx.remote.message_count(), 2);
}

#[tokio::test]
async fn test_sync_without_remote_fails() {
    let ctx = TestContext::offline().await;
    ctx.session.manager.send("alice", "bob", "one").await.unwrap();
    let mut out = Vec::new();

    let err = run(&ctx.session, &mut out).await.unwrap_err();

    assert!(err.to_string().contains("Remote unavailable"));
    assert!(out.is_empty());
}
