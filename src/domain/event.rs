//! Event kinds for the append-only room event log.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Discriminator for rows in the `room_events` log.
///
/// `Chat` is the only kind that carries a payload; `Welcome` and `Leave`
/// are presence markers consumed by the occupancy computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A chat message posted to the room.
    Chat,
    /// An identity (re-)entered the room.
    Welcome,
    /// An identity's connection left the room.
    Leave,
}

impl EventKind {
    /// Returns the string stored in the `kind` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Welcome => "welcome",
            Self::Leave => "leave",
        }
    }

    /// Parses a `kind` column value. Returns `None` for unknown strings.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat" => Some(Self::Chat),
            "welcome" => Some(Self::Welcome),
            "leave" => Some(Self::Leave),
            _ => None,
        }
    }
}
