// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket adapter for the `cv-remote` server.
//!
//! A single connection task owns the socket. Callers hand it commands over a
//! channel and wait on a oneshot for the matching reply; snapshot frames are
//! routed to subscription listeners by the same task. The connection is
//! opened lazily and reopened on the next call after it drops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cv_core::{
    BatchWrite, ClientMessage, ConversationKey, ErrorKind, Message, MessageId, MessagePatch,
    Reply, Request, ServerMessage,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::subscription::{ChangeEvent, ChangeListener, ListenerSlot, Subscription};
use super::{RemoteError, RemoteFuture, RemoteResult, RemoteStore};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    Request {
        message: ClientMessage,
        reply: oneshot::Sender<RemoteResult<Reply>>,
        /// Registered as a subscription when the reply is `Subscribed`.
        listener: Option<(ConversationKey, Arc<ListenerSlot>)>,
    },
    /// Forget a subscription and tell the server. No reply is awaited.
    Release {
        subscription: u64,
        message: ClientMessage,
    },
}

struct Pending {
    reply: oneshot::Sender<RemoteResult<Reply>>,
    listener: Option<(ConversationKey, Arc<ListenerSlot>)>,
}

struct Subscriber {
    key: ConversationKey,
    slot: Arc<ListenerSlot>,
    last: Vec<Message>,
}

/// [`RemoteStore`] speaking the JSON protocol over a WebSocket.
pub struct WebSocketRemote {
    url: String,
    connect_timeout: Duration,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    next_id: Arc<AtomicU64>,
}

impl WebSocketRemote {
    /// Creates an adapter for `url`. No connection is made until the first call.
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        WebSocketRemote {
            url: url.into(),
            connect_timeout,
            commands: Mutex::new(None),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns a handle to the live connection task, connecting if needed.
    ///
    /// The lock is not held while connecting, so a slow handshake does not
    /// stall callers that could use a connection made in the meantime.
    async fn connection(&self) -> RemoteResult<mpsc::UnboundedSender<Command>> {
        if let Some(tx) = self.live().await {
            return Ok(tx);
        }

        debug!(url = %self.url, "connecting");
        let connect = tokio_tungstenite::connect_async(self.url.as_str());
        let (socket, _) = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| RemoteError::Unavailable(format!("timed out connecting to {}", self.url)))?
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let mut commands = self.commands.lock().await;
        if let Some(tx) = commands.as_ref().filter(|tx| !tx.is_closed()) {
            // Someone else connected first; this socket is dropped.
            return Ok(tx.clone());
        }
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(socket, rx));
        *commands = Some(tx.clone());
        Ok(tx)
    }

    async fn live(&self) -> Option<mpsc::UnboundedSender<Command>> {
        let commands = self.commands.lock().await;
        commands.as_ref().filter(|tx| !tx.is_closed()).cloned()
    }

    async fn call(
        &self,
        request: Request,
        listener: Option<(ConversationKey, Arc<ListenerSlot>)>,
    ) -> RemoteResult<(mpsc::UnboundedSender<Command>, Reply)> {
        let commands = self.connection().await?;
        let message = ClientMessage::new(self.next_id.fetch_add(1, Ordering::Relaxed), request);
        let (reply_tx, reply_rx) = oneshot::channel();
        commands
            .send(Command::Request {
                message,
                reply: reply_tx,
                listener,
            })
            .map_err(|_| RemoteError::Unavailable("connection closed".to_string()))?;
        let reply = reply_rx
            .await
            .map_err(|_| RemoteError::Unavailable("connection closed".to_string()))??;
        Ok((commands, reply))
    }

    async fn request(&self, request: Request) -> RemoteResult<Reply> {
        self.call(request, None).await.map(|(_, reply)| reply)
    }
}

fn unexpected(reply: Reply) -> RemoteError {
    RemoteError::Protocol(format!("unexpected reply: {reply:?}"))
}

impl RemoteStore for WebSocketRemote {
    fn probe(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            match self.request(Request::Probe).await? {
                Reply::Probed => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }

    fn add_message(&self, key: ConversationKey, message: Message) -> RemoteFuture<'_, MessageId> {
        Box::pin(async move {
            let request = Request::AddMessage {
                conversation: key,
                message,
            };
            match self.request(request).await? {
                Reply::Added { message_id } => Ok(message_id),
                other => Err(unexpected(other)),
            }
        })
    }

    fn get_messages(&self, key: ConversationKey) -> RemoteFuture<'_, Vec<Message>> {
        Box::pin(async move {
            match self.request(Request::GetMessages { conversation: key }).await? {
                Reply::Messages { messages } => Ok(messages),
                other => Err(unexpected(other)),
            }
        })
    }

    fn update_message(
        &self,
        key: ConversationKey,
        id: MessageId,
        patch: MessagePatch,
    ) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let request = Request::UpdateMessage {
                conversation: key,
                message_id: id,
                patch,
            };
            match self.request(request).await? {
                Reply::Updated => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }

    fn delete_message(&self, key: ConversationKey, id: MessageId) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let request = Request::DeleteMessage {
                conversation: key,
                message_id: id,
            };
            match self.request(request).await? {
                Reply::Deleted => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }

    fn subscribe(
        &self,
        key: ConversationKey,
        listener: ChangeListener,
    ) -> RemoteFuture<'_, Subscription> {
        Box::pin(async move {
            let slot = ListenerSlot::new(listener);
            let request = Request::Subscribe {
                conversation: key.clone(),
            };
            let (commands, reply) = self.call(request, Some((key, Arc::clone(&slot)))).await?;
            let subscription = match reply {
                Reply::Subscribed { subscription } => subscription,
                other => return Err(unexpected(other)),
            };

            let next_id = Arc::clone(&self.next_id);
            Ok(Subscription::new(slot, move || {
                let message = ClientMessage::new(
                    next_id.fetch_add(1, Ordering::Relaxed),
                    Request::Unsubscribe { subscription },
                );
                // A closed connection has already dropped the subscription.
                let _ = commands.send(Command::Release {
                    subscription,
                    message,
                });
            }))
        })
    }

    fn batch_write(&self, writes: Vec<BatchWrite>) -> RemoteFuture<'_, usize> {
        Box::pin(async move {
            match self.request(Request::BatchWrite { writes }).await? {
                Reply::Committed { written } => Ok(written),
                other => Err(unexpected(other)),
            }
        })
    }
}

async fn send_frame(
    sink: &mut futures_util::stream::SplitSink<Socket, Frame>,
    message: &ClientMessage,
) -> RemoteResult<()> {
    let json = message
        .to_json()
        .map_err(|e| RemoteError::Protocol(e.to_string()))?;
    sink.send(Frame::Text(json.into()))
        .await
        .map_err(|e| RemoteError::Unavailable(e.to_string()))
}

fn error_from_kind(kind: ErrorKind, message: String) -> RemoteError {
    match kind {
        ErrorKind::NotFound => RemoteError::NotFound(message),
        ErrorKind::BatchTooLarge | ErrorKind::InvalidRequest => RemoteError::Rejected(message),
        ErrorKind::Internal => RemoteError::Unavailable(message),
    }
}

/// Owns the socket until it closes or every command sender is gone.
async fn run_connection(socket: Socket, mut commands: mpsc::UnboundedReceiver<Command>) {
    let (mut sink, mut stream) = socket.split();
    let mut pending: HashMap<u64, Pending> = HashMap::new();
    let mut subscribers: HashMap<u64, Subscriber> = HashMap::new();

    let reason = loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Request { message, reply, listener }) => {
                    let id = message.id;
                    if let Err(e) = send_frame(&mut sink, &message).await {
                        let _ = reply.send(Err(e.clone()));
                        break e.to_string();
                    }
                    pending.insert(id, Pending { reply, listener });
                }
                Some(Command::Release { subscription, message }) => {
                    subscribers.remove(&subscription);
                    if let Err(e) = send_frame(&mut sink, &message).await {
                        break e.to_string();
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break "client dropped".to_string();
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Frame::Text(text))) => match ServerMessage::from_json(&text) {
                    Ok(message) => dispatch(message, &mut pending, &mut subscribers),
                    Err(e) => warn!(error = %e, "ignoring malformed frame"),
                },
                Some(Ok(Frame::Close(_))) | None => break "connection closed".to_string(),
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
            },
        }
    };

    debug!(%reason, "connection ended");
    // Stop accepting commands before failing what is queued.
    commands.close();
    while let Ok(command) = commands.try_recv() {
        if let Command::Request { reply, .. } = command {
            let _ = reply.send(Err(RemoteError::Unavailable(reason.clone())));
        }
    }
    for (_, request) in pending.drain() {
        let _ = request.reply.send(Err(RemoteError::Unavailable(reason.clone())));
    }
    for (_, subscriber) in subscribers.drain() {
        warn!(conversation = %subscriber.key, "subscription channel lost");
        subscriber
            .slot
            .deliver(ChangeEvent::ChannelLost(subscriber.last));
        subscriber.slot.close();
    }
}

fn dispatch(
    message: ServerMessage,
    pending: &mut HashMap<u64, Pending>,
    subscribers: &mut HashMap<u64, Subscriber>,
) {
    match message {
        ServerMessage::Ok { id, body } => {
            let Some(request) = pending.remove(&id) else {
                debug!(id, "reply for unknown request");
                return;
            };
            if let (Reply::Subscribed { subscription }, Some((key, slot))) =
                (&body, request.listener)
            {
                subscribers.insert(
                    *subscription,
                    Subscriber {
                        key,
                        slot,
                        last: Vec::new(),
                    },
                );
            }
            let _ = request.reply.send(Ok(body));
        }
        ServerMessage::Error {
            id: Some(id),
            kind,
            message,
        } => {
            if let Some(request) = pending.remove(&id) {
                let _ = request.reply.send(Err(error_from_kind(kind, message)));
            }
        }
        ServerMessage::Error {
            id: None, message, ..
        } => {
            warn!(%message, "server rejected a frame");
        }
        ServerMessage::Snapshot {
            subscription,
            messages,
            ..
        } => {
            let Some(subscriber) = subscribers.get_mut(&subscription) else {
                return;
            };
            subscriber.last = messages.clone();
            if !subscriber.slot.deliver(ChangeEvent::Snapshot(messages)) {
                subscribers.remove(&subscription);
            }
        }
    }
}
