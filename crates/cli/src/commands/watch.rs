// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::io::Write;

use super::Session;
use crate::display::format_conversation;
use crate::error::{Error, Result};
use crate::remote::RemoteError;

/// Prints the conversation on every change until `until` resolves.
///
/// Fails if the remote is unreachable at the start or the channel breaks.
pub async fn run<W, F>(session: &Session, with: &str, until: F, mut out: W) -> Result<()>
where
    W: Write + Send + 'static,
    F: Future<Output = ()>,
{
    let user = session.user()?;
    let mut state = session.manager.watch_state();
    let subscription = session
        .manager
        .subscribe(&user, with, move |messages| {
            // Output errors (e.g. a closed pipe) must not abort delivery.
            let _ = writeln!(out, "{}\n", format_conversation(&messages));
            let _ = out.flush();
        })
        .await?;
    if !subscription.is_active() {
        return Err(Error::RemoteRequired);
    }

    tokio::select! {
        _ = until => {
            subscription.unsubscribe();
            Ok(())
        }
        _ = state.wait_for(|s| !s.is_available()) => Err(Error::Remote(RemoteError::Unavailable(
            "subscription channel lost".to_string(),
        ))),
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
