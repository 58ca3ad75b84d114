//! Presence decisions and directory ranking.
//!
//! Occupancy for a room is not simply the count of open sockets: a user
//! whose connection dropped keeps counting as "recently present" for a
//! grace window, while the live-membership map and the leave log draw
//! from disjoint sources (open sockets vs. closed ones), so the two terms
//! never double-count an identity as long as every genuine re-entry
//! records a `welcome` marker. The functions here are pure; the window
//! cutoff itself is applied by the gateway query.

use serde::{Deserialize, Serialize};

use crate::domain::event::EventKind;
use crate::domain::session_id::SessionId;
use crate::persistence::models::RoomActivityRow;

/// Default trailing presence window, in minutes.
pub const DEFAULT_PRESENCE_WINDOW_MINUTES: u32 = 30;

/// A derived directory entry: room, last chat message, and occupancy.
///
/// Never persisted; recomputed from rooms, the event log, and live
/// membership on every directory broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Room row id.
    pub id: i64,
    /// Room session token clients use to open it.
    pub session_id: SessionId,
    /// Room title.
    pub title: String,
    /// Latest chat payload, empty string when the room has no messages.
    pub last_message: String,
    /// Presence-decayed occupant count.
    pub occupancy: u64,
}

/// Combines live connections with recently-departed identities.
///
/// Invariant: the result is always `>= live`.
#[must_use]
pub const fn occupancy(live: u64, recent_leavers: u64) -> u64 {
    live + recent_leavers
}

/// Decides whether a (re-)join should record and announce a `welcome`.
///
/// True when the identity's latest non-chat event in the room is absent
/// or a `leave`: they were not already marked present. A reconnect
/// without an intervening leave (page refresh) therefore stays silent,
/// and a genuine re-entry announces exactly once.
#[must_use]
pub fn should_announce_welcome(latest_non_chat: Option<EventKind>) -> bool {
    matches!(latest_non_chat, None | Some(EventKind::Leave))
}

/// Builds the ranked directory from activity rows paired with each
/// room's live connection count.
///
/// Sorted by occupancy descending; the sort is stable, so ties keep the
/// gateway's fetch order across repeated calls with unchanged inputs.
#[must_use]
pub fn rank_rooms(rows: Vec<(RoomActivityRow, u64)>) -> Vec<RoomSnapshot> {
    let mut snapshots: Vec<RoomSnapshot> = rows
        .into_iter()
        .map(|(row, live)| RoomSnapshot {
            id: row.id,
            session_id: row.session_id,
            title: row.title,
            last_message: row.last_message,
            occupancy: occupancy(live, row.recent_leavers),
        })
        .collect();
    snapshots.sort_by(|a, b| b.occupancy.cmp(&a.occupancy));
    snapshots
}
