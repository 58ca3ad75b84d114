//! Service error types with HTTP status code mapping.
//!
//! [`ChatError`] is the central error type. Each variant maps to a
//! numeric error code and, where a request/response boundary exists, an
//! HTTP status with a structured JSON body. Over WebSocket the same
//! code/message pair is delivered as an `error` event.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::session_id::SessionId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "room not found: 6e1a...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code table in [`ChatError::error_code`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum covering the service's failure taxonomy.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status               |
/// |-----------|---------------------|---------------------------|
/// | 1000–1999 | Validation/Protocol | 400 Bad Request           |
/// | 2000–2999 | Not Found           | 404 Not Found             |
/// | 3000–3999 | Storage/Server      | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Request validation failed before any side effect.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Room action attempted before identification.
    #[error("identify with a nick before room actions")]
    Protocol,

    /// No room exists for the given session token.
    #[error("room not found: {0}")]
    RoomNotFound(SessionId),

    /// Persistence gateway failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Protocol => 1002,
            Self::RoomNotFound(_) => 2001,
            Self::Storage(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Protocol => StatusCode::BAD_REQUEST,
            Self::RoomNotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_taxonomy_ranges() {
        assert_eq!(ChatError::Validation(String::new()).error_code(), 1001);
        assert_eq!(ChatError::Protocol.error_code(), 1002);
        assert_eq!(ChatError::RoomNotFound(SessionId::new()).error_code(), 2001);
        assert_eq!(ChatError::Storage(String::new()).error_code(), 3001);
        assert_eq!(ChatError::Internal(String::new()).error_code(), 3000);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            ChatError::Validation(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ChatError::Protocol.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ChatError::RoomNotFound(SessionId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ChatError::Storage(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
