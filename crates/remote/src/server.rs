// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Handles client connections, request routing, and snapshot fanout to
//! subscriptions.

use std::collections::HashMap;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use cv_core::{ClientMessage, ConversationKey, ErrorKind, Reply, Request, ServerMessage};

use crate::state::ServerState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bind to `addr` and run the WebSocket server.
pub async fn run(addr: SocketAddr, state: ServerState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", listener.local_addr()?);
    serve(listener, state).await
}

/// Accept connections from an already-bound listener until it fails.
pub async fn serve(listener: TcpListener, state: ServerState) -> std::io::Result<()> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), BoxError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    // Subscribe before serving requests so no change is missed
    let mut changes = state.subscribe();
    let mut subscriptions: HashMap<u64, ConversationKey> = HashMap::new();

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        for response in handle_client_message(&text, &state, &mut subscriptions).await {
                            ws_sink.send(Message::Text(response.to_json()?.into())).await?;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer_addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types (Binary, Pong, Frame)
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} stream ended", peer_addr);
                        break;
                    }
                }
            }

            changed = changes.recv() => {
                match changed {
                    Ok(key) => {
                        for snapshot in snapshots_for(&key, &state, &subscriptions).await {
                            if let Err(e) = ws_sink.send(Message::Text(snapshot.to_json()?.into())).await {
                                warn!("Failed to send snapshot to {}: {}", peer_addr, e);
                                return Ok(());
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        // Announcements were lost; refresh every subscription.
                        warn!("Client {} lagged by {} changes", peer_addr, n);
                        for (&id, key) in &subscriptions {
                            let messages = state.messages(key).await;
                            let snapshot = ServerMessage::snapshot(id, key.clone(), messages);
                            ws_sink.send(Message::Text(snapshot.to_json()?.into())).await?;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Snapshots owed to this connection's subscriptions on `key`.
async fn snapshots_for(
    key: &ConversationKey,
    state: &ServerState,
    subscriptions: &HashMap<u64, ConversationKey>,
) -> Vec<ServerMessage> {
    let ids: Vec<u64> = subscriptions
        .iter()
        .filter(|(_, k)| *k == key)
        .map(|(&id, _)| id)
        .collect();
    if ids.is_empty() {
        return Vec::new();
    }
    let messages = state.messages(key).await;
    ids.into_iter()
        .map(|id| ServerMessage::snapshot(id, key.clone(), messages.clone()))
        .collect()
}

fn error_kind(error: &cv_core::Error) -> ErrorKind {
    match error {
        cv_core::Error::MessageNotFound(_) => ErrorKind::NotFound,
        cv_core::Error::BatchTooLarge { .. } => ErrorKind::BatchTooLarge,
        cv_core::Error::NotAuthor { .. } | cv_core::Error::InvalidParticipant(_) => {
            ErrorKind::InvalidRequest
        }
        cv_core::Error::Io(_) | cv_core::Error::Json(_) => ErrorKind::Internal,
    }
}

/// Process a client frame and return the frames to send back, in order.
pub(crate) async fn handle_client_message(
    text: &str,
    state: &ServerState,
    subscriptions: &mut HashMap<u64, ConversationKey>,
) -> Vec<ServerMessage> {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Malformed frame: {}", e);
            return vec![ServerMessage::error(None, ErrorKind::InvalidRequest, e.to_string())];
        }
    };
    debug!("Received request {}: {:?}", msg.id, msg.request);

    let id = msg.id;
    match handle_request(msg.request, state, subscriptions).await {
        Ok((reply, snapshot)) => {
            let mut responses = vec![ServerMessage::ok(id, reply)];
            responses.extend(snapshot);
            responses
        }
        Err(e) => {
            if matches!(e, cv_core::Error::Io(_) | cv_core::Error::Json(_)) {
                error!("Request {} failed: {}", id, e);
            }
            vec![ServerMessage::error(Some(id), error_kind(&e), e.to_string())]
        }
    }
}

/// Applies one request. Subscribe also yields the initial snapshot.
async fn handle_request(
    request: Request,
    state: &ServerState,
    subscriptions: &mut HashMap<u64, ConversationKey>,
) -> cv_core::Result<(Reply, Option<ServerMessage>)> {
    let reply = match request {
        Request::Probe => {
            state.probe().await?;
            Reply::Probed
        }
        Request::AddMessage {
            conversation,
            message,
        } => {
            let message_id = state.add(&conversation, &message).await?;
            Reply::Added { message_id }
        }
        Request::GetMessages { conversation } => Reply::Messages {
            messages: state.messages(&conversation).await,
        },
        Request::UpdateMessage {
            conversation,
            message_id,
            patch,
        } => {
            state.update(&conversation, &message_id, &patch).await?;
            Reply::Updated
        }
        Request::DeleteMessage {
            conversation,
            message_id,
        } => {
            state.delete(&conversation, &message_id).await?;
            Reply::Deleted
        }
        Request::BatchWrite { writes } => Reply::Committed {
            written: state.batch_write(&writes).await?,
        },
        Request::Subscribe { conversation } => {
            let subscription = state.next_subscription_id();
            subscriptions.insert(subscription, conversation.clone());
            let messages = state.messages(&conversation).await;
            debug!("Subscription {} on {}", subscription, conversation);
            let snapshot = ServerMessage::snapshot(subscription, conversation, messages);
            return Ok((Reply::Subscribed { subscription }, Some(snapshot)));
        }
        Request::Unsubscribe { subscription } => {
            subscriptions.remove(&subscription);
            Reply::Unsubscribed
        }
    };
    Ok((reply, None))
}
