//! In-memory gateway double for tests.
//!
//! Mirrors the Postgres semantics, including the atomic lookup-or-create
//! for identities and the latest-non-chat-per-identity window logic of
//! the directory query. Test-only knobs allow backdating events and
//! poisoning a room's lookups to exercise failure isolation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use super::PersistenceGateway;
use super::models::{ChatEvent, HistoryRow, Identity, Room, RoomActivityRow};
use crate::domain::event::EventKind;
use crate::domain::session_id::SessionId;
use crate::error::ChatError;

#[derive(Debug, Default)]
struct Inner {
    identities: Vec<Identity>,
    rooms: Vec<Room>,
    events: Vec<ChatEvent>,
    poisoned: HashSet<SessionId>,
    fail_appends: bool,
}

/// Mutex-backed in-memory store implementing [`PersistenceGateway`].
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every lookup of the given session fail with a storage error.
    pub fn poison(&self, session: SessionId) {
        self.inner.lock().unwrap().poisoned.insert(session);
    }

    /// Makes subsequent `append_event` calls fail with a storage error.
    pub fn fail_appends(&self, fail: bool) {
        self.inner.lock().unwrap().fail_appends = fail;
    }

    /// Appends an event with an explicit timestamp (for window tests).
    pub fn push_event_at(
        &self,
        identity_id: i64,
        room_id: i64,
        kind: EventKind,
        payload: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> ChatEvent {
        let mut inner = self.inner.lock().unwrap();
        let event = ChatEvent {
            id: inner.events.len() as i64 + 1,
            identity_id,
            room_id,
            kind,
            payload: payload.map(str::to_string),
            created_at,
        };
        inner.events.push(event.clone());
        event
    }

    /// Snapshot of the full event log, oldest first.
    pub fn events(&self) -> Vec<ChatEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Number of stored identities.
    pub fn identity_count(&self) -> usize {
        self.inner.lock().unwrap().identities.len()
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn resolve_identity(&self, name: &str) -> Result<Identity, ChatError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.identities.iter().find(|i| i.name == name) {
            return Ok(existing.clone());
        }
        let identity = Identity {
            id: inner.identities.len() as i64 + 1,
            name: name.to_string(),
        };
        inner.identities.push(identity.clone());
        Ok(identity)
    }

    async fn create_room(&self, title: &str, session_id: SessionId) -> Result<Room, ChatError> {
        let mut inner = self.inner.lock().unwrap();
        let room = Room {
            id: inner.rooms.len() as i64 + 1,
            session_id,
            title: title.to_string(),
        };
        inner.rooms.push(room.clone());
        Ok(room)
    }

    async fn find_room_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Room>, ChatError> {
        let inner = self.inner.lock().unwrap();
        if inner.poisoned.contains(&session_id) {
            return Err(ChatError::Storage("poisoned room".to_string()));
        }
        Ok(inner
            .rooms
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned())
    }

    async fn append_event(
        &self,
        identity_id: i64,
        room_id: i64,
        kind: EventKind,
        payload: Option<&str>,
    ) -> Result<ChatEvent, ChatError> {
        if self.inner.lock().unwrap().fail_appends {
            return Err(ChatError::Storage("append disabled".to_string()));
        }
        Ok(self.push_event_at(identity_id, room_id, kind, payload, Utc::now()))
    }

    async fn latest_non_chat_event(
        &self,
        room_id: i64,
        identity_id: i64,
    ) -> Result<Option<ChatEvent>, ChatError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .iter()
            .filter(|e| {
                e.room_id == room_id && e.identity_id == identity_id && e.kind != EventKind::Chat
            })
            .max_by_key(|e| e.id)
            .cloned())
    }

    async fn rooms_with_activity(
        &self,
        window_minutes: u32,
    ) -> Result<Vec<RoomActivityRow>, ChatError> {
        let inner = self.inner.lock().unwrap();
        let cutoff = Utc::now() - Duration::minutes(i64::from(window_minutes));

        Ok(inner
            .rooms
            .iter()
            .map(|room| {
                let last_message = inner
                    .events
                    .iter()
                    .filter(|e| e.room_id == room.id && e.kind == EventKind::Chat)
                    .max_by_key(|e| (e.created_at, e.id))
                    .and_then(|e| e.payload.clone())
                    .unwrap_or_default();

                let identities: HashSet<i64> = inner
                    .events
                    .iter()
                    .filter(|e| e.room_id == room.id && e.kind != EventKind::Chat)
                    .map(|e| e.identity_id)
                    .collect();
                let recent_leavers = identities
                    .iter()
                    .filter(|identity_id| {
                        inner
                            .events
                            .iter()
                            .filter(|e| {
                                e.room_id == room.id
                                    && e.identity_id == **identity_id
                                    && e.kind != EventKind::Chat
                            })
                            .max_by_key(|e| (e.created_at, e.id))
                            .is_some_and(|latest| {
                                latest.kind == EventKind::Leave && latest.created_at >= cutoff
                            })
                    })
                    .count() as u64;

                RoomActivityRow {
                    id: room.id,
                    session_id: room.session_id,
                    title: room.title.clone(),
                    last_message,
                    recent_leavers,
                }
            })
            .collect())
    }

    async fn event_history(&self, room_id: i64) -> Result<Vec<HistoryRow>, ChatError> {
        let inner = self.inner.lock().unwrap();
        inner
            .events
            .iter()
            .filter(|e| e.room_id == room_id)
            .map(|e| {
                let nick = inner
                    .identities
                    .iter()
                    .find(|i| i.id == e.identity_id)
                    .map(|i| i.name.clone())
                    .ok_or_else(|| ChatError::Storage("dangling identity".to_string()))?;
                Ok(HistoryRow {
                    id: e.id,
                    identity_id: e.identity_id,
                    nick,
                    kind: e.kind,
                    payload: e.payload.clone(),
                    created_at: e.created_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_is_idempotent_per_name() {
        let store = MemoryGateway::new();
        let a = store.resolve_identity("alice").await.unwrap();
        let again = store.resolve_identity("alice").await.unwrap();
        assert_eq!(a, again);
        assert_eq!(store.identity_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_resolution_yields_one_identity() {
        use std::sync::Arc;
        let store = Arc::new(MemoryGateway::new());
        let a = Arc::clone(&store);
        let b = Arc::clone(&store);
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { a.resolve_identity("mallory").await }),
            tokio::spawn(async move { b.resolve_identity("mallory").await }),
        );
        let ia = ra.unwrap().unwrap();
        let ib = rb.unwrap().unwrap();
        assert_eq!(ia.id, ib.id);
        assert_eq!(store.identity_count(), 1);
    }

    #[tokio::test]
    async fn window_counts_recent_leaves_only() {
        let store = MemoryGateway::new();
        let identity = store.resolve_identity("alice").await.unwrap();
        let stale = store.resolve_identity("bob").await.unwrap();
        let room = store.create_room("lobby", SessionId::new()).await.unwrap();

        // alice left 29 minutes ago: counted. bob left 31 minutes ago: not.
        store.push_event_at(
            identity.id,
            room.id,
            EventKind::Leave,
            None,
            Utc::now() - Duration::minutes(29),
        );
        store.push_event_at(
            stale.id,
            room.id,
            EventKind::Leave,
            None,
            Utc::now() - Duration::minutes(31),
        );

        let rows = store.rooms_with_activity(30).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().unwrap().recent_leavers, 1);
    }

    #[tokio::test]
    async fn leave_superseded_by_welcome_is_not_counted() {
        let store = MemoryGateway::new();
        let identity = store.resolve_identity("alice").await.unwrap();
        let room = store.create_room("lobby", SessionId::new()).await.unwrap();

        store.push_event_at(
            identity.id,
            room.id,
            EventKind::Leave,
            None,
            Utc::now() - Duration::minutes(5),
        );
        store.push_event_at(
            identity.id,
            room.id,
            EventKind::Welcome,
            None,
            Utc::now() - Duration::minutes(1),
        );

        let rows = store.rooms_with_activity(30).await.unwrap();
        assert_eq!(rows.first().unwrap().recent_leavers, 0);
    }
}
