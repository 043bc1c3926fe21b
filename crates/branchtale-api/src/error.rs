//! Branchtale API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use branchtale_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable has an invalid value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A domain operation failed.
    Domain(DomainError),
    /// No play session exists under the requested id.
    SessionNotFound(Uuid),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "session_not_found",
                format!("play session {id} does not exist"),
            ),
            Self::Domain(err) => {
                let (status, code) = match &err {
                    DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                    DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                    DomainError::Integrity(_) => (StatusCode::CONFLICT, "integrity_error"),
                    DomainError::GenerationFailure(_) => {
                        (StatusCode::BAD_GATEWAY, "generation_failed")
                    }
                    DomainError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
                };
                (status, code, err.reason().to_owned())
            }
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError::from(err).into_response();
        response.status()
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::NotFound("Story with ID 7 was not found.".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_integrity_maps_to_409() {
        assert_eq!(
            status_of(DomainError::Integrity("root node A is missing".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_upstream_failures_map_to_502() {
        assert_eq!(
            status_of(DomainError::GenerationFailure("quota exceeded".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(DomainError::Transport("connection refused".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unknown_session_maps_to_404() {
        let response = ApiError::SessionNotFound(Uuid::new_v4()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
