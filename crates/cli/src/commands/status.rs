// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Session;
use crate::display::format_status;
use crate::error::Result;

pub async fn run(session: &Session, out: &mut dyn Write) -> Result<()> {
    let state = session.manager.probe().await;
    writeln!(out, "{}", format_status(state, session.config.remote_url()))?;
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
