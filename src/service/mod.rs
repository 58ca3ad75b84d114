//! Service layer: business logic orchestration.
//!
//! [`ChatRoomEngine`] coordinates per-connection room actions against
//! the presence logic and the persistence gateway; [`RoomDirectory`]
//! owns room lifecycle and the ranked directory computation.

pub mod directory;
pub mod engine;

pub use directory::RoomDirectory;
pub use engine::ChatRoomEngine;
