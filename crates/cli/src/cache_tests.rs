// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the local cache module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use chrono::{TimeZone, Utc};
use cv_core::{Content, MessagePatch};
use tempfile::tempdir;

fn key() -> ConversationKey {
    ConversationKey::between("alice", "bob").unwrap()
}

fn message(id: &str, sender: &str, secs: u32) -> Message {
    Message::new(
        MessageId::new(id),
        sender,
        format!("text {id}"),
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, secs).unwrap(),
    )
}

#[test]
fn test_load_unknown_conversation_is_empty() {
    let cache = FileCache::in_memory();
    assert!(cache.load(&key()).is_empty());
    assert!(cache.conversations().is_empty());
}

#[test]
fn test_append_keeps_insertion_order() {
    let cache = FileCache::in_memory();
    cache.append(&key(), message("m1", "alice", 0)).unwrap();
    cache.append(&key(), message("m2", "bob", 0)).unwrap();
    cache.append(&key(), message("m3", "alice", 1)).unwrap();

    let ids: Vec<String> = cache.load(&key()).iter().map(|m| m.id.to_string()).collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[test]
fn test_append_duplicate_id_is_noop() {
    let cache = FileCache::in_memory();
    cache.append(&key(), message("m1", "alice", 0)).unwrap();
    let mut dup = message("m1", "alice", 0);
    dup.content = Content::from("different");
    cache.append(&key(), dup).unwrap();

    let messages = cache.load(&key());
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, Content::from("text m1"));
}

#[test]
fn test_replace_all_overwrites() {
    let cache = FileCache::in_memory();
    cache.append(&key(), message("local_1", "alice", 0)).unwrap();

    cache
        .replace_all(&key(), vec![message("r1", "alice", 0), message("r2", "bob", 1)])
        .unwrap();

    let ids: Vec<String> = cache.load(&key()).iter().map(|m| m.id.to_string()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[test]
fn test_replace_all_with_empty_drops_conversation() {
    let cache = FileCache::in_memory();
    cache.append(&key(), message("m1", "alice", 0)).unwrap();
    cache.replace_all(&key(), Vec::new()).unwrap();
    assert!(cache.conversations().is_empty());
}

#[test]
fn test_update_mutates_in_place() {
    let cache = FileCache::in_memory();
    cache.append(&key(), message("m1", "alice", 0)).unwrap();

    let patch = MessagePatch::new("edited", Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
    let found = cache.update(&key(), &MessageId::new("m1"), &|m| m.apply(&patch)).unwrap();

    assert!(found);
    let stored = cache.find(&key(), &MessageId::new("m1")).unwrap();
    assert_eq!(stored.content, Content::from("edited"));
    assert!(stored.edited);
}

#[test]
fn test_update_missing_is_noop() {
    let cache = FileCache::in_memory();
    let found = cache
        .update(&key(), &MessageId::new("ghost"), &|m| m.edited = true)
        .unwrap();
    assert!(!found);
    assert!(cache.load(&key()).is_empty());
}

#[test]
fn test_remove() {
    let cache = FileCache::in_memory();
    cache.append(&key(), message("m1", "alice", 0)).unwrap();
    cache.append(&key(), message("m2", "bob", 1)).unwrap();

    assert!(cache.remove(&key(), &MessageId::new("m1")).unwrap());
    assert!(!cache.remove(&key(), &MessageId::new("m1")).unwrap());

    let ids: Vec<String> = cache.load(&key()).iter().map(|m| m.id.to_string()).collect();
    assert_eq!(ids, vec!["m2"]);
}

#[test]
fn test_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let other = ConversationKey::between("alice", "carol").unwrap();

    {
        let cache = FileCache::open(&path).unwrap();
        cache.append(&key(), message("m1", "alice", 0)).unwrap();
        cache.append(&other, message("m2", "carol", 1)).unwrap();
        cache.remove(&other, &MessageId::new("m2")).unwrap();
        cache.append(&other, message("m3", "carol", 2)).unwrap();
    }

    let cache = FileCache::open(&path).unwrap();
    assert_eq!(cache.conversations(), vec![key(), other.clone()]);
    assert_eq!(cache.load(&key()), vec![message("m1", "alice", 0)]);
    assert_eq!(cache.load(&other), vec![message("m3", "carol", 2)]);
}

#[test]
fn test_open_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let cache = FileCache::open(&dir.path().join("absent.json")).unwrap();
    assert!(cache.conversations().is_empty());
    assert_eq!(cache.path(), Some(dir.path().join("absent.json").as_path()));
}

#[test]
fn test_open_corrupt_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "[[[").unwrap();

    assert!(matches!(FileCache::open(&path), Err(CacheError::Serialization(_))));
}

#[test]
fn test_write_failure_keeps_memory_state() {
    let dir = tempdir().unwrap();
    // A directory at the record path makes every write fail.
    let path = dir.path().join("cache.json");
    std::fs::create_dir(&path).unwrap();
    let cache = FileCache {
        path: Some(path),
        conversations: Mutex::new(Conversations::new()),
    };

    let result = cache.append(&key(), message("m1", "alice", 0));

    assert!(result.is_err());
    assert_eq!(cache.load(&key()).len(), 1);
}
