//! Mapping of domain errors onto HTTP responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use doccon_core::error::DocconError;
use serde::Serialize;
use tracing::error;

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub DocconError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DocconError> for ApiError {
    fn from(err: DocconError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DocconError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(DocconError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(DocconError::validation(rejection.body_text()))
    }
}

impl ApiError {
    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            DocconError::Validation { .. } => (StatusCode::BAD_REQUEST, "Validation failed"),
            DocconError::InvalidTransition { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid status transition")
            }
            DocconError::AlreadyExists { .. } => (StatusCode::CONFLICT, "Already exists"),
            DocconError::MissingToken => (StatusCode::UNAUTHORIZED, "Access token required"),
            DocconError::AuthenticationFailed { .. } => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
            DocconError::InvalidToken { .. } => (StatusCode::FORBIDDEN, "Invalid token"),
            DocconError::TokenExpired => (StatusCode::FORBIDDEN, "Token expired"),
            DocconError::AuthorizationDenied { .. } => (StatusCode::FORBIDDEN, "Access denied"),
            DocconError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found"),
            DocconError::Database(_)
            | DocconError::Storage(_)
            | DocconError::Certificate(_)
            | DocconError::Crypto(_)
            | DocconError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title) = self.status_and_title();
        let message = if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: title,
                message,
            }),
        )
            .into_response()
    }
}
