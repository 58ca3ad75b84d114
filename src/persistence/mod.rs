//! Persistence layer: durable storage of identities, rooms, and the
//! room event log.
//!
//! Provides the [`PersistenceGateway`] trait consumed by the service
//! layer. The concrete implementation uses `sqlx::PgPool` for async
//! PostgreSQL access; tests run against an in-memory double with the
//! same semantics.

use std::future::Future;

use crate::domain::event::EventKind;
use crate::domain::session_id::SessionId;
use crate::error::ChatError;

pub mod models;
pub mod postgres;

#[cfg(test)]
pub mod memory;

use models::{ChatEvent, HistoryRow, Identity, Room, RoomActivityRow};

/// Parameterized read/write operations against the durable store.
///
/// No business logic lives here: the gateway executes queries and
/// returns typed rows. The store's own row-level transaction discipline
/// serializes conflicting writes; callers issue no cross-statement
/// transactions and tolerate interleaving.
pub trait PersistenceGateway: Send + Sync {
    /// Looks up an identity by display name, creating it if absent.
    ///
    /// Atomic from the caller's perspective: concurrent first use of the
    /// same name yields exactly one row.
    fn resolve_identity(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Identity, ChatError>> + Send;

    /// Persists a new room with its generated session token.
    fn create_room(
        &self,
        title: &str,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Room, ChatError>> + Send;

    /// Fetches a room by session token.
    fn find_room_by_session(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Option<Room>, ChatError>> + Send;

    /// Appends one row to the event log.
    fn append_event(
        &self,
        identity_id: i64,
        room_id: i64,
        kind: EventKind,
        payload: Option<&str>,
    ) -> impl Future<Output = Result<ChatEvent, ChatError>> + Send;

    /// The identity's most recent non-chat event in the room, if any.
    fn latest_non_chat_event(
        &self,
        room_id: i64,
        identity_id: i64,
    ) -> impl Future<Output = Result<Option<ChatEvent>, ChatError>> + Send;

    /// Bulk directory query: every room with its latest chat payload and
    /// the count of distinct identities whose most recent non-chat event
    /// is a `leave` within the trailing window.
    fn rooms_with_activity(
        &self,
        window_minutes: u32,
    ) -> impl Future<Output = Result<Vec<RoomActivityRow>, ChatError>> + Send;

    /// Full event history of a room joined with author names, oldest
    /// first.
    fn event_history(
        &self,
        room_id: i64,
    ) -> impl Future<Output = Result<Vec<HistoryRow>, ChatError>> + Send;
}

pub use postgres::PgGateway;
