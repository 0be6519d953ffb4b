// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Session;
use crate::display::format_conversation;
use crate::error::Result;

pub async fn run(session: &Session, with: &str, json: bool, out: &mut dyn Write) -> Result<()> {
    let user = session.user()?;
    let messages = session.manager.get_messages(&user, with).await?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&messages)?)?;
    } else {
        writeln!(out, "{}", format_conversation(&messages))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
