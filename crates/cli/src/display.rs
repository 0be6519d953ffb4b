// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use cv_core::{Content, Message};

use crate::connectivity::StoreState;
use crate::sync::SyncReport;

/// Maximum line width for message bodies (excluding the 4-space indent).
const WRAP_WIDTH: usize = 96;

/// Wrap text at word boundaries if it's a single line.
///
/// Multi-line content is returned as-is to preserve the author's formatting.
pub fn wrap_text(content: &str, width: usize) -> String {
    if content.contains('\n') || content.len() <= width {
        return content.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in content.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

fn body(content: &Content) -> String {
    match content {
        Content::Text(text) => wrap_text(text, WRAP_WIDTH),
        Content::Structured(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

/// Format a message header line: `[<id>] <sender> at <time>`.
pub fn format_message_header(message: &Message) -> String {
    let mut line = format!(
        "[{}] {} at {}",
        message.id,
        message.sender_id,
        message.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    if message.id.is_local() {
        line.push_str(" (pending)");
    }
    if message.edited {
        line.push_str(" (edited)");
    }
    line
}

/// Format a message as a header followed by its indented body.
pub fn format_message(message: &Message) -> Vec<String> {
    let mut lines = vec![format_message_header(message)];
    for line in body(&message.content).lines() {
        lines.push(format!("    {}", line));
    }
    lines
}

/// Format a whole conversation, one blank line between messages.
pub fn format_conversation(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "No messages.".to_string();
    }
    messages
        .iter()
        .map(|m| format_message(m).join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One-line summary of a reconciliation pass.
pub fn format_sync_report(report: &SyncReport) -> String {
    if report.success {
        return format!(
            "Synced {} message(s) in {} batch(es)",
            report.messages_written, report.batches_committed
        );
    }
    if report.failed_conversations.is_empty() {
        return "Remote unavailable, nothing synced".to_string();
    }
    let failed: Vec<_> = report
        .failed_conversations
        .iter()
        .map(|k| k.as_str())
        .collect();
    format!(
        "Synced {} message(s) in {} batch(es); failed: {}",
        report.messages_written,
        report.batches_committed,
        failed.join(", ")
    )
}

/// Status line for `convo status`.
pub fn format_status(state: StoreState, remote_url: Option<&str>) -> String {
    match remote_url {
        Some(url) => format!("{} ({})", state, url),
        None => format!("{} (no remote configured)", state),
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
