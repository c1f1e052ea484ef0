//! Trackpitch — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use trackpitch_core::error::DomainError;
use trackpitch_core::store::StoreError;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Short machine-readable error title.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A domain-level failure bubbled up from a handler.
    Domain(DomainError),
    /// The request named a status outside the submission lifecycle.
    InvalidStatus(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Domain(DomainError::NotFound { title, message, .. }) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: title,
                    message: message.to_string(),
                },
            ),
            Self::Domain(err @ DomainError::Store(StoreError::Conflict)) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: "write_conflict",
                    message: err.to_string(),
                },
            ),
            Self::Domain(err @ DomainError::Store(StoreError::NotFound)) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not_found",
                    message: err.to_string(),
                },
            ),
            Self::Domain(err) => (
                StatusCode::from_u16(err.status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                ErrorBody {
                    error: "infrastructure_error",
                    message: err.to_string(),
                },
            ),
            Self::InvalidStatus(raw) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "invalid_status",
                    message: format!("'{raw}' is not a valid submission status"),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
