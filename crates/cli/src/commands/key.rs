// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use cv_core::ConversationKey;

use crate::error::Result;

pub fn run(a: &str, b: &str, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", ConversationKey::between(a, b)?)?;
    Ok(())
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
