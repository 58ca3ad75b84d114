//! Transport-level fan-out and live room membership.
//!
//! [`ConnectionHub`] owns the process-local membership state: which
//! connections are open, which rooms each one has joined, and a bounded
//! outbound channel per connection. It provides the one-to-room and
//! one-to-all broadcast primitives the engine builds on. Membership is
//! mutated concurrently by independent connection tasks, so all maps sit
//! behind [`tokio::sync::RwLock`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use super::messages::ServerEvent;
use crate::domain::session_id::SessionId;

/// Unique identifier for one open WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(uuid::Uuid);

impl ConnId {
    /// Creates a fresh connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct HubInner {
    /// Outbound sender per open connection.
    senders: RwLock<HashMap<ConnId, mpsc::Sender<ServerEvent>>>,
    /// Live membership: session token -> connections in the room.
    members: RwLock<HashMap<SessionId, HashSet<ConnId>>>,
    /// Reverse index: connection -> joined session tokens.
    joined: RwLock<HashMap<ConnId, HashSet<SessionId>>>,
    /// Capacity of each per-connection outbound channel.
    buffer: usize,
}

/// Shared fan-out hub, cheaply cloneable.
#[derive(Debug, Clone)]
pub struct ConnectionHub {
    inner: Arc<HubInner>,
}

impl ConnectionHub {
    /// Creates a hub whose per-connection outbound channels hold up to
    /// `buffer` undelivered events.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                senders: RwLock::new(HashMap::new()),
                members: RwLock::new(HashMap::new()),
                joined: RwLock::new(HashMap::new()),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Registers a new connection and returns its outbound receiver.
    ///
    /// The connection task drains the receiver into the socket; when the
    /// task ends it must call [`Self::unregister`].
    pub async fn register(&self, conn: ConnId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        self.inner.senders.write().await.insert(conn, tx);
        self.inner.joined.write().await.insert(conn, HashSet::new());
        rx
    }

    /// Removes a connection and every room membership it held.
    pub async fn unregister(&self, conn: ConnId) {
        let sessions = self.inner.joined.write().await.remove(&conn);
        if let Some(sessions) = sessions {
            let mut members = self.inner.members.write().await;
            for session in sessions {
                let now_empty = members.get_mut(&session).is_some_and(|set| {
                    set.remove(&conn);
                    set.is_empty()
                });
                if now_empty {
                    members.remove(&session);
                }
            }
        }
        self.inner.senders.write().await.remove(&conn);
    }

    /// Adds the connection to a room's live-membership set.
    pub async fn join_room(&self, conn: ConnId, session: SessionId) {
        self.inner
            .members
            .write()
            .await
            .entry(session)
            .or_default()
            .insert(conn);
        self.inner
            .joined
            .write()
            .await
            .entry(conn)
            .or_default()
            .insert(session);
    }

    /// Removes the connection from a room's live-membership set.
    pub async fn leave_room(&self, conn: ConnId, session: SessionId) {
        let mut members = self.inner.members.write().await;
        let now_empty = members.get_mut(&session).is_some_and(|set| {
            set.remove(&conn);
            set.is_empty()
        });
        if now_empty {
            members.remove(&session);
        }
        drop(members);
        if let Some(set) = self.inner.joined.write().await.get_mut(&conn) {
            set.remove(&session);
        }
    }

    /// Number of open connections currently in the room.
    pub async fn live_member_count(&self, session: SessionId) -> u64 {
        self.inner
            .members
            .read()
            .await
            .get(&session)
            .map_or(0, |set| set.len() as u64)
    }

    /// Session tokens of every room the connection has joined.
    pub async fn rooms_of(&self, conn: ConnId) -> Vec<SessionId> {
        self.inner
            .joined
            .read()
            .await
            .get(&conn)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Delivers an event to every member of the room except `exclude`.
    pub async fn emit_to_room(&self, session: SessionId, event: &ServerEvent, exclude: ConnId) {
        let targets: Vec<ConnId> = self
            .inner
            .members
            .read()
            .await
            .get(&session)
            .map(|set| set.iter().copied().filter(|c| *c != exclude).collect())
            .unwrap_or_default();
        self.deliver(&targets, event).await;
    }

    /// Delivers an event to every registered connection.
    pub async fn emit_to_all(&self, event: &ServerEvent) {
        let targets: Vec<ConnId> = self.inner.senders.read().await.keys().copied().collect();
        self.deliver(&targets, event).await;
    }

    /// Pushes the event into each target's outbound channel.
    ///
    /// A full or closed channel drops the event for that connection only:
    /// a slow consumer cannot stall the broadcasting handler.
    async fn deliver(&self, targets: &[ConnId], event: &ServerEvent) {
        let senders = self.inner.senders.read().await;
        for conn in targets {
            if let Some(tx) = senders.get(conn)
                && tx.try_send(event.clone()).is_err()
            {
                tracing::debug!(conn = %conn, "outbound buffer full or closed, dropping event");
            }
        }
    }
}
