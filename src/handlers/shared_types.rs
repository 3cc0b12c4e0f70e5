use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{ServiceError, ValidationError};

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    // ---
    pub error: String,
}

/// Body of plain acknowledgement responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    // ---
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error returned by handlers and extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    // ---
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    // ---
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred.",
        )
    }

    /// Maps a service error, reporting "not found" rejections as 404.
    ///
    /// Routes that answer 404 for a missing target use this instead of the
    /// plain `From` conversion.
    pub fn with_not_found(err: ServiceError) -> Self {
        // ---
        match err {
            ServiceError::Validation(v) if v.is_not_found() => Self::not_found(v.to_string()),
            other => other.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        // ---
        let status = match err {
            ValidationError::NotAuthorized => StatusCode::FORBIDDEN,
            ValidationError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        // ---
        match err {
            ServiceError::Validation(v) => v.into(),
            ServiceError::Store(e) => {
                tracing::error!("Store failure: {:?}", e);
                Self::internal()
            }
            ServiceError::Internal(e) => {
                tracing::error!("Internal failure: {:#}", e);
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // ---
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        // ---
        tracing::debug!("Rejected path parameter: {}", rejection.body_text());
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// 200 with the list as JSON, or 204 when it is empty.
pub fn list_or_no_content<T: Serialize>(items: Vec<T>) -> Response {
    // ---
    if items.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, Json(items)).into_response()
    }
}
