// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::{TimeZone, Utc};
use yare::parameterized;

fn key() -> ConversationKey {
    ConversationKey::between("alice", "bob").unwrap()
}

fn test_message() -> Message {
    Message::new(
        MessageId::new("m1"),
        "alice",
        "hello",
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    )
}

#[parameterized(
    probe = { Request::Probe },
    add = { Request::AddMessage { conversation: key(), message: test_message() } },
    get = { Request::GetMessages { conversation: key() } },
    update = { Request::UpdateMessage {
        conversation: key(),
        message_id: MessageId::new("m1"),
        patch: MessagePatch::new("edited", Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap()),
    } },
    delete = { Request::DeleteMessage { conversation: key(), message_id: MessageId::new("m1") } },
    batch = { Request::BatchWrite { writes: vec![BatchWrite { conversation: key(), message: test_message() }] } },
    subscribe = { Request::Subscribe { conversation: key() } },
    unsubscribe = { Request::Unsubscribe { subscription: 7 } },
)]
fn client_message_roundtrip(request: Request) {
    let msg = ClientMessage::new(42, request);
    let json = msg.to_json().unwrap();
    let parsed = ClientMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[parameterized(
    probed = { ServerMessage::ok(1, Reply::Probed) },
    added = { ServerMessage::ok(2, Reply::Added { message_id: MessageId::new("abc") }) },
    messages = { ServerMessage::ok(3, Reply::Messages { messages: vec![test_message()] }) },
    committed = { ServerMessage::ok(4, Reply::Committed { written: 500 }) },
    subscribed = { ServerMessage::ok(5, Reply::Subscribed { subscription: 9 }) },
    error = { ServerMessage::error(Some(6), ErrorKind::NotFound, "message not found: m1") },
    unparsed_error = { ServerMessage::error(None, ErrorKind::InvalidRequest, "bad frame") },
    snapshot = { ServerMessage::snapshot(9, key(), vec![test_message()]) },
)]
fn server_message_roundtrip(msg: ServerMessage) {
    let json = msg.to_json().unwrap();
    let parsed = ServerMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[test]
fn message_json_format() {
    let json = ClientMessage::new(1, Request::Probe).to_json().unwrap();
    assert!(json.contains("\"id\":1"));
    assert!(json.contains("\"type\":\"probe\""));

    let json = ClientMessage::new(2, Request::GetMessages { conversation: key() })
        .to_json()
        .unwrap();
    assert!(json.contains("\"type\":\"get_messages\""));
    assert!(json.contains("\"conversation\":\"alice_bob\""));

    let json = ServerMessage::error(Some(3), ErrorKind::BatchTooLarge, "too many")
        .to_json()
        .unwrap();
    assert!(json.contains("\"type\":\"error\""));
    assert!(json.contains("\"kind\":\"batch_too_large\""));

    let json = ServerMessage::ok(4, Reply::Committed { written: 2 }).to_json().unwrap();
    assert!(json.contains("\"type\":\"ok\""));
    assert!(json.contains("\"kind\":\"committed\""));
}
