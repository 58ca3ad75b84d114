//! WebSocket message types: client commands and server events.
//!
//! Dispatch is an explicit enumerated table: every inbound command and
//! every outbound event is a named variant, discriminated by a tag field.
//! Unknown or malformed frames answer with an `error` event instead of
//! being silently dropped.

use serde::{Deserialize, Serialize};

use crate::domain::presence::RoomSnapshot;
use crate::domain::session_id::SessionId;
use crate::error::ChatError;
use crate::persistence::models::{HistoryRow, Room};

/// Commands a client can send over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Bind a display name to this connection. Must precede room actions.
    Nick {
        /// Chosen display name.
        name: String,
    },
    /// Create a new room and join it.
    CreateRoom {
        /// Room title.
        title: String,
    },
    /// Join an existing room by its session token.
    OpenRoom {
        /// Target room session token.
        session_id: SessionId,
    },
    /// Post a chat message to a joined room.
    NewMsg {
        /// Target room session token (fan-out address).
        session_id: SessionId,
        /// Target room row id (event-log owner).
        room_id: i64,
        /// Message text.
        text: String,
    },
    /// Request a fresh directory broadcast.
    GetRooms,
}

/// Events the server delivers to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Identification succeeded; the connection is bound to this identity.
    NickAck {
        /// Resolved identity row id.
        identity_id: i64,
        /// Display name as stored.
        name: String,
    },
    /// Reply to `create_room` with the newly created room.
    RoomCreated {
        /// The created room, including its generated session token.
        room: Room,
    },
    /// Reply to `open_room` with the room and its full ordered history.
    RoomOpened {
        /// The opened room.
        room: Room,
        /// Event history, oldest first, for initial render.
        history: Vec<HistoryRow>,
    },
    /// A new occupant entered the room (sent to the other occupants).
    Welcome {
        /// Display name of the joiner.
        nick: String,
    },
    /// An occupant's connection left the room (sent to the others).
    Bye {
        /// Display name of the leaver.
        nick: String,
    },
    /// A chat message from another occupant, pre-formatted as
    /// "`nick`: `text`".
    NewMsg {
        /// Formatted message line.
        text: String,
    },
    /// Completion signal for the sender's own `new_msg`.
    MsgAck,
    /// The ranked room directory, pushed to every connection after any
    /// state-changing action.
    RoomChange {
        /// Snapshots sorted by occupancy descending.
        rooms: Vec<RoomSnapshot>,
    },
    /// A command failed; the connection stays usable.
    Error {
        /// Numeric error code (same table as the REST surface).
        code: u32,
        /// Human-readable message.
        message: String,
    },
}

impl From<&ChatError> for ServerEvent {
    fn from(err: &ChatError) -> Self {
        Self::Error {
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}
