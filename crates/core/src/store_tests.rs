// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::clock::ManualClock;
use chrono::TimeZone;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
}

fn key() -> ConversationKey {
    ConversationKey::between("alice", "bob").unwrap()
}

fn message(sender: &str, text: &str, clock: &ManualClock) -> Message {
    Message::new(MessageId::new("client-side"), sender, text, clock.now())
}

#[test]
fn add_assigns_server_id() {
    let clock = clock();
    let mut store = DocumentStore::new();

    let msg = message("alice", "hi", &clock);
    let id = store.add(&key(), &msg, &clock);

    assert_ne!(id, msg.id);
    assert!(!id.is_local());
    let stored = store.messages(&key());
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].content, msg.content);
    assert_eq!(stored[0].timestamp, msg.timestamp);
}

#[test]
fn messages_keep_creation_order() {
    let clock = clock();
    let mut store = DocumentStore::new();

    for text in ["one", "two", "three"] {
        store.add(&key(), &message("alice", text, &clock), &clock);
    }

    let texts: Vec<String> = store
        .messages(&key())
        .iter()
        .map(|m| m.content.to_string())
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[test]
fn messages_for_unknown_conversation_is_empty() {
    let store = DocumentStore::new();
    assert!(store.messages(&key()).is_empty());
}

#[test]
fn update_applies_patch() {
    let clock = clock();
    let mut store = DocumentStore::new();
    let id = store.add(&key(), &message("alice", "hi", &clock), &clock);

    let edited_at = clock.now();
    store.update(&key(), &id, &MessagePatch::new("hello", edited_at)).unwrap();

    let stored = &store.messages(&key())[0];
    assert_eq!(stored.content.to_string(), "hello");
    assert!(stored.edited);
    assert_eq!(stored.edited_at, Some(edited_at));
}

#[test]
fn update_missing_message_is_not_found() {
    let clock = clock();
    let mut store = DocumentStore::new();

    let err = store
        .update(&key(), &MessageId::new("nope"), &MessagePatch::new("x", clock.now()))
        .unwrap_err();
    assert!(matches!(err, Error::MessageNotFound(_)));
}

#[test]
fn delete_removes_message_and_empty_conversation() {
    let clock = clock();
    let mut store = DocumentStore::new();
    let id = store.add(&key(), &message("alice", "hi", &clock), &clock);

    store.delete(&key(), &id).unwrap();

    assert!(store.messages(&key()).is_empty());
    assert!(store.conversations().is_empty());
    assert!(matches!(store.delete(&key(), &id), Err(Error::MessageNotFound(_))));
}

#[test]
fn batch_write_reports_touched_conversations() {
    let clock = clock();
    let mut store = DocumentStore::new();
    let other = ConversationKey::between("alice", "carol").unwrap();

    let writes = vec![
        BatchWrite { conversation: key(), message: message("alice", "a", &clock) },
        BatchWrite { conversation: other.clone(), message: message("carol", "b", &clock) },
        BatchWrite { conversation: key(), message: message("bob", "c", &clock) },
    ];
    let touched = store.batch_write(&writes, &clock).unwrap();

    assert_eq!(touched, vec![key(), other]);
    assert_eq!(store.len(), 3);
}

#[test]
fn batch_write_over_limit_writes_nothing() {
    let clock = clock();
    let mut store = DocumentStore::new();

    let writes: Vec<BatchWrite> = (0..=MAX_BATCH_WRITES)
        .map(|i| BatchWrite {
            conversation: key(),
            message: message("alice", &format!("m{i}"), &clock),
        })
        .collect();
    let err = store.batch_write(&writes, &clock).unwrap_err();

    assert!(matches!(err, Error::BatchTooLarge { actual: 501, max: 500 }));
    assert!(store.is_empty());
}

#[test]
fn store_survives_json_roundtrip() {
    let clock = clock();
    let mut store = DocumentStore::new();
    store.add(&key(), &message("alice", "hi", &clock), &clock);
    store.probe(&clock);

    let json = serde_json::to_string(&store).unwrap();
    let mut back: DocumentStore = serde_json::from_str(&json).unwrap();

    assert_eq!(back.messages(&key()), store.messages(&key()));
    // Sequence continues after reload.
    back.add(&key(), &message("bob", "yo", &clock), &clock);
    assert_eq!(back.messages(&key())[1].content.to_string(), "yo");
}
