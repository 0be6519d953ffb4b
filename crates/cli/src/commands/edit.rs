// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use cv_core::MessageId;

use super::Session;
use crate::error::{Error, Result};

pub async fn run(
    session: &Session,
    with: &str,
    id: &str,
    text: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let user = session.user()?;
    let id = MessageId::from(id);
    if !session.manager.edit_message(&user, with, &id, text).await? {
        return Err(Error::NotYours(id.to_string()));
    }
    writeln!(out, "Edited {}", id)?;
    Ok(())
}

#[cfg(test)]
#[path = "edit_tests.rs"]
mod tests;
