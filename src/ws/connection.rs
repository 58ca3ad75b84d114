//! WebSocket connection state machine.
//!
//! Runs the read/write loop for a single connection. Each connection
//! owns a [`ConnContext`] — the explicit per-connection state object
//! holding its id and, once `nick` has been processed, its resolved
//! identity. Commands arriving before identification are answered with
//! a protocol error and leave the connection usable.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::hub::ConnId;
use super::messages::{ClientCommand, ServerEvent};
use crate::app_state::AppState;
use crate::error::ChatError;
use crate::persistence::PersistenceGateway;
use crate::service::ChatRoomEngine;

/// Per-connection state: `Unidentified → Identified → (InRoom)*`.
///
/// Room memberships live in the hub; only the identity binding is kept
/// here, set exactly once by the first successful `nick` command.
#[derive(Debug)]
pub struct ConnContext {
    /// This connection's id, stable for its lifetime.
    pub conn_id: ConnId,
    /// Resolved identity; `None` until `nick` succeeds.
    pub identity: Option<crate::persistence::models::Identity>,
}

impl ConnContext {
    /// Creates the context for a freshly accepted connection.
    #[must_use]
    pub fn new(conn_id: ConnId) -> Self {
        Self {
            conn_id,
            identity: None,
        }
    }
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Drains the hub's outbound channel into the socket.
/// - Reads commands from the client and dispatches them to the engine.
/// - On close (clean or not), runs the full disconnect cleanup.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let conn_id = ConnId::new();
    let mut outbound = state.hub.register(conn_id).await;
    let mut ctx = ConnContext::new(conn_id);
    let (mut ws_tx, mut ws_rx) = socket.split();

    tracing::debug!(conn = %conn_id, "ws connection opened");

    loop {
        tokio::select! {
            event = outbound.recv() => {
                match event {
                    Some(event) => {
                        let json = serde_json::to_string(&event).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) =
                            dispatch_command(&text, &mut ctx, state.engine.as_ref()).await
                        {
                            let json = serde_json::to_string(&reply).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    state
        .engine
        .disconnect_all(conn_id, ctx.identity.as_ref())
        .await;
    tracing::debug!(conn = %conn_id, "ws connection closed");
}

/// Dispatches one inbound frame, returning the direct reply, if any.
///
/// Broadcast side effects (welcome/bye/new_msg fan-out, directory
/// updates) flow through the hub; only the requester's own reply is
/// returned here.
async fn dispatch_command<G: PersistenceGateway>(
    text: &str,
    ctx: &mut ConnContext,
    engine: &ChatRoomEngine<G>,
) -> Option<ServerEvent> {
    let Ok(command) = serde_json::from_str::<ClientCommand>(text) else {
        return Some(ServerEvent::from(&ChatError::Validation(
            "malformed command".to_string(),
        )));
    };

    if let ClientCommand::Nick { name } = &command {
        return Some(match engine.identify(name).await {
            Ok(identity) => {
                let ack = ServerEvent::NickAck {
                    identity_id: identity.id,
                    name: identity.name.clone(),
                };
                ctx.identity = Some(identity);
                ack
            }
            Err(error) => ServerEvent::from(&error),
        });
    }

    // Every other command is a room action and needs an identity owner.
    let Some(identity) = ctx.identity.clone() else {
        return Some(ServerEvent::from(&ChatError::Protocol));
    };

    match command {
        ClientCommand::Nick { .. } => None,
        ClientCommand::CreateRoom { title } => Some(
            match engine.create_room(ctx.conn_id, &identity, &title).await {
                Ok(room) => ServerEvent::RoomCreated { room },
                Err(error) => ServerEvent::from(&error),
            },
        ),
        ClientCommand::OpenRoom { session_id } => Some(
            match engine.open_room(ctx.conn_id, &identity, session_id).await {
                Ok((room, history)) => ServerEvent::RoomOpened { room, history },
                Err(error) => ServerEvent::from(&error),
            },
        ),
        ClientCommand::NewMsg {
            session_id,
            room_id,
            text,
        } => Some(
            match engine
                .post_message(ctx.conn_id, &identity, session_id, room_id, &text)
                .await
            {
                Ok(()) => ServerEvent::MsgAck,
                Err(error) => ServerEvent::from(&error),
            },
        ),
        ClientCommand::GetRooms => {
            engine.broadcast_directory().await;
            None
        }
    }
}
