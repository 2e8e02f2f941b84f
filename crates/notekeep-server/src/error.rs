//! API error types with JSON responses.
//!
//! Store errors are rendered by their kind. A resource the caller does not
//! own answers exactly like a missing one.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notekeep_core::ErrorKind;
use notekeep_store::StoreError;
use serde::Serialize;

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),

    /// Store error, classified by kind.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Get the error code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Store(e) => match e.kind() {
                ErrorKind::NotFound | ErrorKind::Unauthorized => "NOT_FOUND",
                ErrorKind::Conflict => "CONFLICT",
                ErrorKind::RevokedSession => "REVOKED_SESSION",
                ErrorKind::InvalidToken => "INVALID_TOKEN",
                ErrorKind::Internal => "INTERNAL_ERROR",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) => match e.kind() {
                ErrorKind::NotFound | ErrorKind::Unauthorized => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::RevokedSession | ErrorKind::InvalidToken => StatusCode::UNAUTHORIZED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> String {
        match self {
            Self::Store(e) => match e.kind() {
                ErrorKind::NotFound | ErrorKind::Unauthorized => "resource not found".to_string(),
                ErrorKind::Internal => "internal error".to_string(),
                ErrorKind::RevokedSession => "session revoked".to_string(),
                ErrorKind::InvalidToken => "invalid token".to_string(),
                ErrorKind::Conflict => e.to_string(),
            },
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the response.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.code().to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
