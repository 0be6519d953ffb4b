// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use cv_core::MessageId;

use super::Session;
use crate::error::{Error, Result};

pub async fn run(session: &Session, with: &str, id: &str, out: &mut dyn Write) -> Result<()> {
    let user = session.user()?;
    let id = MessageId::from(id);
    if !session.manager.delete_message(&user, with, &id).await? {
        return Err(Error::NotYours(id.to_string()));
    }
    writeln!(out, "Deleted {}", id)?;
    Ok(())
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
