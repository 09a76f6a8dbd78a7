use std::{borrow::Cow, fmt};

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app_state::RoomRegistry;
use crate::connection::ConnectionHandle;
use crate::error::RelayError;
use crate::router::SignalRouter;
use crate::signal::SignalMessage;

// Close code for a client id already taken in the room
pub const CLOSE_ALREADY_PRESENT: u16 = 4009;

#[derive(Debug)]
enum CloseReason {
    ClientClosed,
    StreamEnded,
    ReadError(axum::Error),
    WriteFailed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientClosed => f.write_str("client closed"),
            Self::StreamEnded => f.write_str("stream ended"),
            Self::ReadError(e) => write!(f, "read error: {e}"),
            Self::WriteFailed => f.write_str("write failed"),
        }
    }
}

pub struct Session {
    room: String,
    client: String,
    registry: RoomRegistry,
    router: SignalRouter,
}

impl Session {
    pub fn new(room: String, client: String, registry: RoomRegistry) -> Self {
        let router = SignalRouter::new(registry.clone());
        Self {
            room,
            client,
            registry,
            router,
        }
    }

    pub async fn run(self, mut socket: WebSocket) {
        let (handle, rx) = ConnectionHandle::new(self.client.clone());

        match self
            .registry
            .join_and_announce(&self.room, &self.client, handle)
            .await
        {
            Ok(fanout) => {
                info!(room = %self.room, client = %self.client, notified = fanout.delivered, "client joined room");
            }
            Err(e @ RelayError::AlreadyPresent { .. }) => {
                warn!(room = %self.room, client = %self.client, error = %e, "refusing connection");
                let frame = CloseFrame {
                    code: CLOSE_ALREADY_PRESENT,
                    reason: Cow::from("client id already in room"),
                };
                let _ = socket.send(Message::Close(Some(frame))).await;
                return;
            }
            Err(e) => {
                // registered, but the announcement could not be built
                warn!(room = %self.room, client = %self.client, error = %e, "join announcement failed");
            }
        }

        let (sender, receiver) = socket.split();
        self.drive(sender, receiver, rx).await;
    }

    // Cleanup runs once, whichever direction stops first
    async fn drive<S, R>(self, sender: S, mut receiver: R, rx: mpsc::UnboundedReceiver<String>)
    where
        S: Sink<Message> + Unpin + Send + 'static,
        R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    {
        let mut send_task = tokio::spawn(write_loop(sender, rx));

        let reason = tokio::select! {
            reason = self.read_loop(&mut receiver) => reason,
            _ = &mut send_task => CloseReason::WriteFailed,
        };
        send_task.abort();

        self.close(reason).await;
    }

    async fn read_loop<R>(&self, receiver: &mut R) -> CloseReason
    where
        R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => self.dispatch(&text).await,
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => self.dispatch(&text).await,
                    Err(_) => {
                        warn!(room = %self.room, client = %self.client, "dropping non-UTF-8 binary frame");
                    }
                },
                Ok(Message::Close(_)) => return CloseReason::ClientClosed,
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => return CloseReason::ReadError(e),
            }
        }
        CloseReason::StreamEnded
    }

    async fn dispatch(&self, text: &str) {
        let message = match SignalMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(room = %self.room, client = %self.client, error = %e, "dropping malformed frame");
                return;
            }
        };
        if let Err(e) = self
            .router
            .route(&self.room, &self.client, text, &message)
            .await
        {
            warn!(room = %self.room, client = %self.client, kind = %message.kind, error = %e, "failed to route frame");
        }
    }

    async fn close(self, reason: CloseReason) {
        match self
            .registry
            .leave_and_announce(&self.room, &self.client)
            .await
        {
            Ok(Some(fanout)) => {
                info!(room = %self.room, client = %self.client, reason = %reason, notified = fanout.delivered, "client left room");
            }
            Ok(None) => {
                debug!(room = %self.room, client = %self.client, reason = %reason, "client already removed");
            }
            Err(e) => {
                warn!(room = %self.room, client = %self.client, error = %e, "leave announcement failed");
            }
        }
    }
}

async fn write_loop<S>(mut sender: S, mut rx: mpsc::UnboundedReceiver<String>)
where
    S: Sink<Message> + Unpin,
{
    while let Some(text) = rx.recv().await {
        if sender.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
    let _ = sender.close().await;
}
