// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Session;
use crate::error::Result;

pub async fn run(session: &Session, to: &str, text: &str, out: &mut dyn Write) -> Result<()> {
    let user = session.user()?;
    let message = session.manager.send(&user, to, text).await?;

    if message.id.is_local() {
        writeln!(
            out,
            "Saved {} locally (run `convo sync` once the remote is back)",
            message.id
        )?;
    } else {
        writeln!(out, "Sent {}", message.id)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
