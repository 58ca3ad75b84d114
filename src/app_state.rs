//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::PgGateway;
use crate::service::ChatRoomEngine;
use crate::ws::hub::ConnectionHub;

/// The production engine, wired to the PostgreSQL gateway.
pub type Engine = ChatRoomEngine<PgGateway>;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat room engine for all room actions.
    pub engine: Arc<Engine>,
    /// Fan-out hub owning live membership and per-connection channels.
    pub hub: ConnectionHub,
    /// Persistence gateway, used directly by the history REST endpoint.
    pub gateway: Arc<PgGateway>,
}
