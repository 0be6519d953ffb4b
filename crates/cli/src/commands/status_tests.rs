// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::testing::{output, TestContext};

#[tokio::test]
async fn test_status_reprobes() {
    let ctx = TestContext::offline().await;
    ctx.remote.set_offline(false);
    let mut out = Vec::new();

    run(&ctx.session, &mut out).await.unwrap();

    assert_eq!(output(&out), "remote-available (no remote configured)\n");
}

#[tokio::test]
async fn test_status_local_only() {
    let ctx = TestContext::offline().await;
    let mut out = Vec::new();
    run(&ctx.session, &mut out).await.unwrap();
    assert!(output(&out).starts_with("local-only"));
}
