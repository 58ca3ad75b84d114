//! Room directory: lifecycle and the ranked, presence-annotated listing.

use std::sync::Arc;

use crate::domain::event::EventKind;
use crate::domain::presence::{self, RoomSnapshot};
use crate::domain::session_id::SessionId;
use crate::error::ChatError;
use crate::persistence::PersistenceGateway;
use crate::persistence::models::{Identity, Room};
use crate::ws::hub::ConnectionHub;

/// Owns room creation and lookup, and computes the ranked directory.
///
/// Holds no room state of its own: rooms live in the store, live counts
/// in the hub. `list_ranked` recomputes the whole directory on every
/// call — counts change with every join/leave/message anywhere in the
/// system and room cardinality is small, so full recomputation buys
/// consistency without an incremental index.
#[derive(Debug, Clone)]
pub struct RoomDirectory<G> {
    gateway: Arc<G>,
    hub: ConnectionHub,
    window_minutes: u32,
}

impl<G: PersistenceGateway> RoomDirectory<G> {
    /// Creates a directory over the given store and hub.
    #[must_use]
    pub fn new(gateway: Arc<G>, hub: ConnectionHub, window_minutes: u32) -> Self {
        Self {
            gateway,
            hub,
            window_minutes,
        }
    }

    /// Creates a room with a fresh session token and records the
    /// creator's first `welcome` event, so re-entrants see consistent
    /// history from the start.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] on gateway failure.
    pub async fn create_room(&self, title: &str, creator: &Identity) -> Result<Room, ChatError> {
        let session_id = SessionId::new();
        let room = self.gateway.create_room(title, session_id).await?;
        self.gateway
            .append_event(creator.id, room.id, EventKind::Welcome, None)
            .await?;
        tracing::info!(room_id = room.id, session = %room.session_id, title, "room created");
        Ok(room)
    }

    /// Looks up a room by session token.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::RoomNotFound`] when no room has the token,
    /// [`ChatError::Storage`] on gateway failure.
    pub async fn find_by_session_id(&self, session_id: SessionId) -> Result<Room, ChatError> {
        self.gateway
            .find_room_by_session(session_id)
            .await?
            .ok_or(ChatError::RoomNotFound(session_id))
    }

    /// Computes the full ranked directory: every room with its latest
    /// chat message and presence-decayed occupancy, sorted descending.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] on gateway failure.
    pub async fn list_ranked(&self) -> Result<Vec<RoomSnapshot>, ChatError> {
        let rows = self.gateway.rooms_with_activity(self.window_minutes).await?;
        let mut paired = Vec::with_capacity(rows.len());
        for row in rows {
            let live = self.hub.live_member_count(row.session_id).await;
            paired.push((row, live));
        }
        Ok(presence::rank_rooms(paired))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::persistence::memory::MemoryGateway;
    use crate::ws::hub::ConnId;

    fn directory(gateway: Arc<MemoryGateway>, hub: ConnectionHub) -> RoomDirectory<MemoryGateway> {
        RoomDirectory::new(gateway, hub, 30)
    }

    #[tokio::test]
    async fn create_room_records_creator_welcome() {
        let gateway = Arc::new(MemoryGateway::new());
        let dir = directory(Arc::clone(&gateway), ConnectionHub::new(8));
        let alice = gateway.resolve_identity("alice").await.unwrap();

        let room = dir.create_room("lobby", &alice).await.unwrap();
        assert_eq!(room.title, "lobby");

        let events = gateway.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Welcome);
        assert_eq!(events[0].identity_id, alice.id);
        assert_eq!(events[0].payload, None);
    }

    #[tokio::test]
    async fn find_by_unknown_session_is_not_found() {
        let gateway = Arc::new(MemoryGateway::new());
        let dir = directory(gateway, ConnectionHub::new(8));
        let missing = SessionId::new();
        let err = dir.find_by_session_id(missing).await.unwrap_err();
        assert!(matches!(err, ChatError::RoomNotFound(s) if s == missing));
    }

    #[tokio::test]
    async fn list_ranked_combines_live_and_recent_leavers() {
        let gateway = Arc::new(MemoryGateway::new());
        let hub = ConnectionHub::new(8);
        let dir = directory(Arc::clone(&gateway), hub.clone());
        let alice = gateway.resolve_identity("alice").await.unwrap();
        let bob = gateway.resolve_identity("bob").await.unwrap();

        let quiet = dir.create_room("quiet", &alice).await.unwrap();
        let busy = dir.create_room("busy", &alice).await.unwrap();

        // Two live connections in "busy", one in "quiet".
        for (conn, session) in [
            (ConnId::new(), busy.session_id),
            (ConnId::new(), busy.session_id),
            (ConnId::new(), quiet.session_id),
        ] {
            let _rx = hub.register(conn).await;
            hub.join_room(conn, session).await;
        }
        // Plus a recent leaver in "busy".
        gateway
            .append_event(bob.id, busy.id, EventKind::Leave, None)
            .await
            .unwrap();

        let ranked = dir.list_ranked().await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].title, "busy");
        assert_eq!(ranked[0].occupancy, 3);
        assert_eq!(ranked[1].title, "quiet");
        assert_eq!(ranked[1].occupancy, 1);
    }

    #[tokio::test]
    async fn list_ranked_tie_order_is_stable() {
        let gateway = Arc::new(MemoryGateway::new());
        let dir = directory(Arc::clone(&gateway), ConnectionHub::new(8));
        let alice = gateway.resolve_identity("alice").await.unwrap();

        let first = dir.create_room("first", &alice).await.unwrap();
        let second = dir.create_room("second", &alice).await.unwrap();
        assert!(first.id < second.id);

        for _ in 0..3 {
            let ranked = dir.list_ranked().await.unwrap();
            assert_eq!(ranked[0].title, "first");
            assert_eq!(ranked[1].title, "second");
        }
    }

    #[tokio::test]
    async fn last_message_defaults_to_empty_string() {
        let gateway = Arc::new(MemoryGateway::new());
        let dir = directory(Arc::clone(&gateway), ConnectionHub::new(8));
        let alice = gateway.resolve_identity("alice").await.unwrap();
        let room = dir.create_room("lobby", &alice).await.unwrap();

        let ranked = dir.list_ranked().await.unwrap();
        assert_eq!(ranked[0].last_message, "");

        gateway
            .append_event(alice.id, room.id, EventKind::Chat, Some("hi"))
            .await
            .unwrap();
        let ranked = dir.list_ranked().await.unwrap();
        assert_eq!(ranked[0].last_message, "hi");
    }
}
