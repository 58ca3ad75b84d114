//! REST API layer: route handlers and router composition.
//!
//! The REST surface is deliberately small — the room history endpoint
//! and system routes; everything interactive flows over `/ws`.

pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    handlers::routes()
}
