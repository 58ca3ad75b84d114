//! Room history REST endpoint.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::{ChatError, ErrorResponse};
use crate::persistence::PersistenceGateway;
use crate::persistence::models::HistoryRow;

/// `GET /api/room/{room_id}` — Full ordered event history of a room.
///
/// Returns an empty array for a room with no events (including unknown
/// ids); only a storage failure produces an error status.
///
/// # Errors
///
/// Returns [`ChatError::Storage`] (500) on database failure.
#[utoipa::path(
    get,
    path = "/api/room/{room_id}",
    tag = "Rooms",
    summary = "Room event history",
    description = "Returns the room's append-only event log joined with author names, oldest first. Empty array when the room has no events.",
    params(
        ("room_id" = i64, Path, description = "Room row id"),
    ),
    responses(
        (status = 200, description = "Ordered event history", body = Vec<HistoryRow>),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn room_history(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<HistoryRow>>, ChatError> {
    let rows = state.gateway.event_history(room_id).await?;
    Ok(Json(rows))
}

/// Room routes mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/room/{room_id}", get(room_history))
}
