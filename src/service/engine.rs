//! Chat room engine: per-connection event coordination.
//!
//! [`ChatRoomEngine`] drives every state-changing action — identify,
//! create room, open room, post message, disconnect — against the
//! presence logic, the directory, and the persistence gateway, and ends
//! each one with a directory-wide broadcast so every connected client's
//! lobby view converges on the new global state.

use std::sync::Arc;

use crate::domain::event::EventKind;
use crate::domain::presence;
use crate::domain::session_id::SessionId;
use crate::error::ChatError;
use crate::persistence::PersistenceGateway;
use crate::persistence::models::{HistoryRow, Identity, Room};
use crate::service::directory::RoomDirectory;
use crate::ws::hub::{ConnId, ConnectionHub};
use crate::ws::messages::ServerEvent;

/// Orchestration layer for all room actions.
///
/// Stateless coordinator: connection identity lives in the ws layer's
/// per-connection context, live membership in the hub, everything
/// durable in the store. Handlers for different connections run
/// concurrently; within one action the side-effect order below is fixed
/// (notably broadcast-before-persist in [`Self::post_message`]).
#[derive(Debug, Clone)]
pub struct ChatRoomEngine<G> {
    gateway: Arc<G>,
    directory: RoomDirectory<G>,
    hub: ConnectionHub,
}

impl<G: PersistenceGateway> ChatRoomEngine<G> {
    /// Creates an engine over the given store and hub.
    #[must_use]
    pub fn new(gateway: Arc<G>, hub: ConnectionHub, window_minutes: u32) -> Self {
        let directory = RoomDirectory::new(Arc::clone(&gateway), hub.clone(), window_minutes);
        Self {
            gateway,
            directory,
            hub,
        }
    }

    /// Returns the room directory.
    #[must_use]
    pub fn directory(&self) -> &RoomDirectory<G> {
        &self.directory
    }

    /// Resolves a display name to a stable identity, creating one on
    /// first sight.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] for an empty name (rejected
    /// before any storage call) and [`ChatError::Storage`] on gateway
    /// failure; in both cases the connection stays unidentified.
    pub async fn identify(&self, name: &str) -> Result<Identity, ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::Validation(
                "display name must not be empty".to_string(),
            ));
        }
        let identity = self.gateway.resolve_identity(name).await?;
        tracing::debug!(identity_id = identity.id, nick = %identity.name, "identity resolved");
        Ok(identity)
    }

    /// Creates a room, joins the creator's connection to it, and
    /// broadcasts the updated directory.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] on gateway failure.
    pub async fn create_room(
        &self,
        conn: ConnId,
        creator: &Identity,
        title: &str,
    ) -> Result<Room, ChatError> {
        let room = self.directory.create_room(title, creator).await?;
        self.hub.join_room(conn, room.session_id).await;
        // No other occupants yet; kept for symmetry with open_room.
        self.hub
            .emit_to_room(
                room.session_id,
                &ServerEvent::Welcome {
                    nick: creator.name.clone(),
                },
                conn,
            )
            .await;
        self.broadcast_directory().await;
        Ok(room)
    }

    /// Opens a room by session token: records and announces a `welcome`
    /// if the identity genuinely (re-)entered, joins live membership,
    /// broadcasts the directory, and returns the full ordered history
    /// for initial render.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::RoomNotFound`] for an unknown token (terminal
    /// for this request) and [`ChatError::Storage`] on gateway failure.
    pub async fn open_room(
        &self,
        conn: ConnId,
        identity: &Identity,
        session_id: SessionId,
    ) -> Result<(Room, Vec<HistoryRow>), ChatError> {
        let room = self.directory.find_by_session_id(session_id).await?;

        let latest = self
            .gateway
            .latest_non_chat_event(room.id, identity.id)
            .await?;
        if presence::should_announce_welcome(latest.map(|e| e.kind)) {
            self.gateway
                .append_event(identity.id, room.id, EventKind::Welcome, None)
                .await?;
            self.hub
                .emit_to_room(
                    session_id,
                    &ServerEvent::Welcome {
                        nick: identity.name.clone(),
                    },
                    conn,
                )
                .await;
        }

        self.hub.join_room(conn, session_id).await;
        let history = self.gateway.event_history(room.id).await?;
        self.broadcast_directory().await;
        Ok((room, history))
    }

    /// Posts a chat message: peers receive it before persistence runs,
    /// so wire latency to the store never delays delivery (the sender's
    /// UI already echoed it optimistically). A storage failure is logged
    /// and does not unwind the broadcast. Completes — and therefore acks
    /// the sender — only after broadcast, persistence attempt, and
    /// directory update have all run.
    ///
    /// # Errors
    ///
    /// Currently infallible beyond the `Result` shape; storage failures
    /// are absorbed by design.
    pub async fn post_message(
        &self,
        conn: ConnId,
        identity: &Identity,
        session_id: SessionId,
        room_id: i64,
        text: &str,
    ) -> Result<(), ChatError> {
        self.hub
            .emit_to_room(
                session_id,
                &ServerEvent::NewMsg {
                    text: format!("{}: {}", identity.name, text),
                },
                conn,
            )
            .await;

        if let Err(error) = self
            .gateway
            .append_event(identity.id, room_id, EventKind::Chat, Some(text))
            .await
        {
            tracing::error!(room_id, %error, "failed to persist chat event");
        }

        self.broadcast_directory().await;
        Ok(())
    }

    /// Full cleanup when a connection closes: for every joined room,
    /// notify the remaining occupants and record a `leave`, then drop
    /// the connection from the hub and broadcast the directory once.
    ///
    /// A storage failure in one room's cleanup is logged and must not
    /// abort the cleanup of the others.
    pub async fn disconnect_all(&self, conn: ConnId, identity: Option<&Identity>) {
        if let Some(identity) = identity {
            for session in self.hub.rooms_of(conn).await {
                self.hub
                    .emit_to_room(
                        session,
                        &ServerEvent::Bye {
                            nick: identity.name.clone(),
                        },
                        conn,
                    )
                    .await;
                match self.gateway.find_room_by_session(session).await {
                    Ok(Some(room)) => {
                        if let Err(error) = self
                            .gateway
                            .append_event(identity.id, room.id, EventKind::Leave, None)
                            .await
                        {
                            tracing::warn!(%session, %error, "failed to record leave");
                        }
                    }
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(%session, %error, "room lookup failed during disconnect");
                    }
                }
            }
        }
        self.hub.unregister(conn).await;
        self.broadcast_directory().await;
    }

    /// Recomputes the ranked directory and pushes it to every connected
    /// client, room member or not. Failures are logged; there is no
    /// caller to surface them to.
    pub async fn broadcast_directory(&self) {
        match self.directory.list_ranked().await {
            Ok(rooms) => {
                self.hub
                    .emit_to_all(&ServerEvent::RoomChange { rooms })
                    .await;
            }
            Err(error) => tracing::error!(%error, "directory recomputation failed"),
        }
    }
}
