//! Domain layer: core chat types and presence logic.
//!
//! This module contains the server-side domain model: the room session
//! token, the event-log kind discriminator, and the pure presence
//! functions that turn live membership plus the leave log into the
//! ranked room directory.

pub mod event;
pub mod presence;
pub mod session_id;

pub use event::EventKind;
pub use presence::RoomSnapshot;
pub use session_id::SessionId;
