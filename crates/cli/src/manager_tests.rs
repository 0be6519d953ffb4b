// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use super::*;
use crate::cache::FileCache;
use crate::remote::MemoryRemote;
use chrono::{TimeZone, Utc};
use cv_core::ManualClock;

struct Fixture {
    remote: Arc<MemoryRemote>,
    cache: Arc<FileCache>,
    manager: ConversationManager<MemoryRemote, FileCache>,
}

fn options() -> ManagerOptions {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    ManagerOptions {
        clock: Arc::new(ManualClock::new(start)),
        ..ManagerOptions::default()
    }
}

async fn fixture(online: bool) -> Fixture {
    let remote = Arc::new(MemoryRemote::new());
    remote.set_offline(!online);
    let cache = Arc::new(FileCache::in_memory());
    let manager =
        ConversationManager::start(Arc::clone(&remote), Arc::clone(&cache), options()).await;
    Fixture {
        remote,
        cache,
        manager,
    }
}

fn key() -> ConversationKey {
    ConversationKey::between("alice", "bob").unwrap()
}

fn recorder() -> (Arc<Mutex<Vec<Vec<Message>>>>, impl FnMut(Vec<Message>) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |messages| sink.lock().unwrap().push(messages))
}

#[tokio::test]
async fn test_start_picks_state_from_probe() {
    assert_eq!(fixture(true).await.manager.state(), StoreState::RemoteAvailable);
    assert_eq!(fixture(false).await.manager.state(), StoreState::LocalOnly);
}

#[tokio::test]
async fn test_send_then_get_round_trips_through_remote() {
    let f = fixture(true).await;

    let sent = f.manager.send("alice", "bob", "hello").await.unwrap();
    let fetched = f.manager.get_messages("bob", "alice").await.unwrap();

    assert!(!sent.id.is_local());
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, sent.id);
    assert_eq!(fetched[0].sender_id, "alice");
    assert_eq!(fetched[0].content, Content::from("hello"));
    assert_eq!(fetched[0].timestamp, sent.timestamp);
    assert_eq!(f.cache.load(&key()), fetched);
}

#[tokio::test]
async fn test_send_falls_back_when_remote_fails() {
    let f = fixture(true).await;
    f.remote.set_offline(true);

    let sent = f.manager.send("alice", "bob", "offline").await.unwrap();

    assert!(sent.id.is_local());
    assert_eq!(f.manager.state(), StoreState::LocalOnly);
    assert_eq!(f.cache.load(&key()), vec![sent]);
}

#[tokio::test]
async fn test_local_only_skips_remote() {
    let f = fixture(true).await;
    f.remote.set_offline(true);
    f.manager.send("alice", "bob", "one").await.unwrap();

    // Back online, but nobody probed yet.
    f.remote.set_offline(false);
    let before = f.remote.calls();
    f.manager.send("alice", "bob", "two").await.unwrap();
    let messages = f.manager.get_messages("alice", "bob").await.unwrap();

    assert_eq!(f.remote.calls(), before);
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.id.is_local()));
}

#[tokio::test]
async fn test_participant_ids_with_separator_are_refused() {
    let f = fixture(false).await;

    let sent = f.manager.send("a_b", "c", "private to a_b and c").await;
    let read = f.manager.get_messages("a", "b_c").await;

    assert!(matches!(sent, Err(crate::error::Error::Core(_))));
    assert!(matches!(read, Err(crate::error::Error::Core(_))));
    assert!(f.cache.conversations().is_empty());
}

#[tokio::test]
async fn test_get_falls_back_to_cache() {
    let f = fixture(true).await;
    f.manager.send("alice", "bob", "cached").await.unwrap();
    f.manager.get_messages("alice", "bob").await.unwrap();
    f.remote.set_offline(true);

    let messages = f.manager.get_messages("alice", "bob").await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(f.manager.state(), StoreState::LocalOnly);
}

#[tokio::test]
async fn test_probe_does_not_push_local_messages() {
    let f = fixture(false).await;
    f.manager.send("alice", "bob", "queued").await.unwrap();

    f.remote.set_offline(false);
    assert_eq!(f.manager.probe().await, StoreState::RemoteAvailable);

    assert_eq!(f.remote.message_count(), 0);
    assert_eq!(f.remote.calls().batches, 0);
}

#[tokio::test]
async fn test_edit_by_author_updates_both_stores() {
    let f = fixture(true).await;
    let sent = f.manager.send("alice", "bob", "draft").await.unwrap();

    assert!(f.manager.edit_message("alice", "bob", &sent.id, "final").await.unwrap());

    let remote = f.remote.snapshot(&key());
    assert_eq!(remote[0].content, Content::from("final"));
    assert!(remote[0].edited);
    assert!(remote[0].edited_at.unwrap() > sent.timestamp);
    let cached = f.cache.find(&key(), &sent.id).unwrap();
    assert_eq!(cached, remote[0]);
}

#[tokio::test]
async fn test_edit_by_non_author_is_refused_remotely() {
    let f = fixture(true).await;
    let sent = f.manager.send("alice", "bob", "mine").await.unwrap();

    assert!(!f.manager.edit_message("bob", "alice", &sent.id, "hijacked").await.unwrap());
    assert!(!f.manager.delete_message("bob", "alice", &sent.id).await.unwrap());

    let remote = f.remote.snapshot(&key());
    assert_eq!(remote[0].content, Content::from("mine"));
    assert!(!remote[0].edited);
    assert_eq!(f.remote.calls().updates, 0);
    assert_eq!(f.remote.calls().deletes, 0);
    assert_eq!(f.manager.state(), StoreState::RemoteAvailable);
}

#[tokio::test]
async fn test_edit_by_non_author_is_refused_locally() {
    let f = fixture(false).await;
    let sent = f.manager.send("alice", "bob", "mine").await.unwrap();

    assert!(!f.manager.edit_message("bob", "alice", &sent.id, "hijacked").await.unwrap());
    assert!(!f.manager.delete_message("bob", "alice", &sent.id).await.unwrap());

    assert_eq!(f.cache.load(&key()), vec![sent]);
}

#[tokio::test]
async fn test_edit_unknown_message_is_false() {
    let f = fixture(true).await;
    let missing = MessageId::from("missing");
    assert!(!f.manager.edit_message("alice", "bob", &missing, "x").await.unwrap());

    let f = fixture(false).await;
    assert!(!f.manager.edit_message("alice", "bob", &missing, "x").await.unwrap());
}

#[tokio::test]
async fn test_local_edit_and_delete() {
    let f = fixture(false).await;
    let first = f.manager.send("alice", "bob", "one").await.unwrap();
    let second = f.manager.send("alice", "bob", "two").await.unwrap();

    assert!(f.manager.edit_message("alice", "bob", &first.id, "uno").await.unwrap());
    assert!(f.manager.delete_message("alice", "bob", &second.id).await.unwrap());

    let cached = f.cache.load(&key());
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].content, Content::from("uno"));
    assert!(cached[0].edited);
}

#[tokio::test]
async fn test_delete_falls_back_when_remote_fails() {
    let f = fixture(true).await;
    let sent = f.manager.send("alice", "bob", "bye").await.unwrap();
    f.remote.set_offline(true);

    assert!(f.manager.delete_message("alice", "bob", &sent.id).await.unwrap());

    assert!(f.cache.load(&key()).is_empty());
    assert_eq!(f.manager.state(), StoreState::LocalOnly);
    assert_eq!(f.remote.snapshot(&key()).len(), 1);
}

#[tokio::test]
async fn test_subscribe_writes_cache_before_callback() {
    let f = fixture(true).await;
    let cache = Arc::clone(&f.cache);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let _subscription = f
        .manager
        .subscribe("alice", "bob", move |messages| {
            sink.lock().unwrap().push(cache.load(&key()) == messages);
        })
        .await
        .unwrap();
    f.manager.send("bob", "alice", "ping").await.unwrap();
    f.remote.seed(&key(), &Message::new(MessageId::from("x"), "bob", "other client", Utc::now()));

    assert_eq!(*seen.lock().unwrap(), vec![true, true, true]);
    assert_eq!(f.cache.load(&key()).len(), 2);
}

#[tokio::test]
async fn test_subscribe_in_local_only_is_inert() {
    let f = fixture(false).await;
    let (seen, on_change) = recorder();

    let subscription = f.manager.subscribe("alice", "bob", on_change).await.unwrap();

    assert!(!subscription.is_active());
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(f.remote.calls().subscribes, 0);
}

#[tokio::test]
async fn test_unsubscribe_suppresses_event_in_flight() {
    let f = fixture(true).await;
    let (seen, on_change) = recorder();
    let subscription = f.manager.subscribe("alice", "bob", on_change).await.unwrap();

    f.remote.pause_notifications();
    f.manager.send("alice", "bob", "late").await.unwrap();
    subscription.unsubscribe();
    f.remote.resume_notifications();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].is_empty());
}

#[tokio::test]
async fn test_channel_loss_switches_to_local_only() {
    let f = fixture(true).await;
    let (seen, on_change) = recorder();
    let _subscription = f.manager.subscribe("alice", "bob", on_change).await.unwrap();
    f.manager.send("alice", "bob", "before").await.unwrap();

    f.remote.break_channels();

    assert_eq!(f.manager.state(), StoreState::LocalOnly);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().unwrap().len(), 1);
    assert_eq!(f.cache.load(&key()).len(), 1);
}

#[tokio::test]
async fn test_reconcile_without_remote_touches_nothing() {
    let f = fixture(false).await;
    f.manager.send("alice", "bob", "queued").await.unwrap();

    let report = f.manager.reconcile().await;

    assert!(!report.success);
    assert_eq!(report.batches_committed, 0);
    assert_eq!(f.remote.calls().batches, 0);
}

#[tokio::test]
async fn test_reconcile_pushes_then_is_idempotent() {
    let f = fixture(false).await;
    for text in ["a", "b", "c"] {
        f.manager.send("alice", "bob", text).await.unwrap();
    }
    f.remote.set_offline(false);

    let first = f.manager.reconcile().await;
    let second = f.manager.reconcile().await;

    assert!(first.success);
    assert_eq!(first.messages_written, 3);
    assert_eq!(first.batches_committed, 1);
    assert_eq!(second.batches_committed, 0);
    assert_eq!(f.manager.state(), StoreState::RemoteAvailable);

    // Fetching replaces the local ids with remote ones.
    let messages = f.manager.get_messages("alice", "bob").await.unwrap();
    assert!(messages.iter().all(|m| !m.id.is_local()));
    assert_eq!(f.cache.load(&key()), messages);
}

#[tokio::test]
async fn test_failed_reconcile_switches_to_local_only() {
    let f = fixture(false).await;
    f.manager.send("alice", "bob", "queued").await.unwrap();
    f.remote.set_offline(false);
    f.remote.fail_batches_after(0);

    let report = f.manager.reconcile().await;

    assert!(!report.success);
    assert_eq!(f.manager.state(), StoreState::LocalOnly);
}

#[tokio::test]
async fn test_watch_state_sees_fallback() {
    let f = fixture(true).await;
    let mut rx = f.manager.watch_state();
    f.remote.set_offline(true);

    f.manager.send("alice", "bob", "x").await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), StoreState::LocalOnly);
}

#[tokio::test]
async fn test_blank_participant_is_an_error() {
    let f = fixture(true).await;
    assert!(f.manager.send("", "bob", "x").await.is_err());
    assert!(f.manager.get_messages("alice", " ").await.is_err());
}

#[tokio::test]
async fn test_manager_over_trait_objects() {
    let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
    let cache: Arc<dyn LocalCache> = Arc::new(FileCache::in_memory());
    let manager = ConversationManager::start(remote, cache, ManagerOptions::default()).await;

    let sent = manager.send("alice", "bob", "dyn").await.unwrap();
    assert!(!sent.id.is_local());
}
