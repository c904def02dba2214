//! Error types for scfm-api
//!
//! Every failure reaches the client as
//! `{"error": {"code", "message", "fields"?}}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scfm_common::error::FieldErrors;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid session (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Domain error from scfm-common
    #[error(transparent)]
    Common(#[from] scfm_common::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String, Option<FieldErrors>) {
        use scfm_common::Error as E;

        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg, None),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, None),
            ApiError::Common(err) => match err {
                E::Validation(fields) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_FAILED",
                    format!("Validation failed for {} field(s)", fields.len()),
                    Some(fields),
                ),
                E::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
                E::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
                E::InvalidTransition(msg) => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", msg, None)
                }
                E::TicketClosed => (
                    StatusCode::CONFLICT,
                    "TICKET_CLOSED",
                    "Ticket is closed".to_string(),
                    None,
                ),
                E::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
                E::Auth(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
                E::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg, None),
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    other.to_string(),
                    None,
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = self.parts();

        if status.is_server_error() {
            error!(code, "Request failed: {}", message);
        }

        let mut body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        if let Some(fields) = fields {
            body["error"]["fields"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use scfm_common::Error;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(Error::field("genre", "Genre is required.").into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(Error::NotFound("x".into()).into()), StatusCode::NOT_FOUND);
        assert_eq!(status_of(Error::InvalidInput("x".into()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::InvalidTransition("x".into()).into()), StatusCode::CONFLICT);
        assert_eq!(status_of(Error::TicketClosed.into()), StatusCode::CONFLICT);
        assert_eq!(status_of(Error::Conflict("x".into()).into()), StatusCode::CONFLICT);
        assert_eq!(status_of(Error::Auth("x".into()).into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(Error::Forbidden("x".into()).into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(Error::Internal("x".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let response = ApiError::from(Error::field("artwork", "Artwork is required.")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(json["error"]["fields"]["artwork"], "Artwork is required.");
    }
}
