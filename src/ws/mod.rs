//! WebSocket layer: connection handling, message routing, fan-out.
//!
//! The WebSocket endpoint at `/ws` carries every chat interaction:
//! identification, room create/open, messages, and the pushed directory
//! snapshots. The [`hub::ConnectionHub`] owns live membership and the
//! broadcast primitives.

pub mod connection;
pub mod handler;
pub mod hub;
pub mod messages;
