//! # roomcast
//!
//! Multi-room realtime chat service: clients join named rooms over
//! WebSocket, exchange messages, and see a live-updated room directory
//! with presence-decayed occupancy counts.
//!
//! The core is the room/presence coordination engine: room lifecycle,
//! live-connection membership, a grace window that keeps abruptly
//! disconnected users counted for a while, durable event history, and a
//! global directory broadcast after every state-changing action.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS connection loop (ws/)
//!     ├── REST handlers (api/)
//!     │
//!     ├── ChatRoomEngine + RoomDirectory (service/)
//!     ├── ConnectionHub fan-out (ws/hub)
//!     ├── Presence logic (domain/)
//!     │
//!     └── PersistenceGateway → PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
