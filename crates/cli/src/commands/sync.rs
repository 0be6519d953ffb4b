// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Session;
use crate::display::format_sync_report;
use crate::error::{Error, Result};

pub async fn run(session: &Session, out: &mut dyn Write) -> Result<()> {
    let report = session.manager.reconcile().await;
    let summary = format_sync_report(&report);
    if !report.success {
        return Err(Error::SyncIncomplete(summary));
    }
    writeln!(out, "{}", summary)?;
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
