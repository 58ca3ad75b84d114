//! Row types returned by the persistence gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::event::EventKind;
use crate::domain::session_id::SessionId;

/// A user identity row from the `identities` table.
///
/// Created on first `nick` resolution, keyed by the chosen display name.
/// Never mutated and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable row id.
    pub id: i64,
    /// Human-chosen display name; unique across all identities.
    pub name: String,
}

/// A room row from the `rooms` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Stable row id.
    pub id: i64,
    /// Opaque routable token; unique, generated at creation.
    pub session_id: SessionId,
    /// Room title as entered by the creator.
    pub title: String,
}

/// An append-only row from the `room_events` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Monotonic row id.
    pub id: i64,
    /// Identity that produced the event.
    pub identity_id: i64,
    /// Room the event is scoped to.
    pub room_id: i64,
    /// Event discriminator.
    pub kind: EventKind,
    /// Message text; `Some` only for [`EventKind::Chat`].
    pub payload: Option<String>,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One row of the bulk directory query: a room with its latest chat
/// message and the count of identities whose most recent non-chat event
/// is a `leave` inside the presence window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomActivityRow {
    /// Room row id.
    pub id: i64,
    /// Room session token.
    pub session_id: SessionId,
    /// Room title.
    pub title: String,
    /// Latest chat payload, or the empty string when none exists.
    pub last_message: String,
    /// Distinct recently-departed identities (see `rooms_with_activity`).
    pub recent_leavers: u64,
}

/// An event-history row joined with the author's identity, as served by
/// `GET /api/room/{room_id}` and the `room_opened` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryRow {
    /// Event row id.
    pub id: i64,
    /// Author identity row id.
    pub identity_id: i64,
    /// Author display name.
    pub nick: String,
    /// Event discriminator.
    pub kind: EventKind,
    /// Message text; `None` for welcome/leave markers.
    pub payload: Option<String>,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}
