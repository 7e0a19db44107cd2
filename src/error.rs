//! Error types for the contact-intake service.
//!
//! This module provides the error taxonomy shared by every layer, using `thiserror`,
//! and its translation into the `{ok: false, error}` JSON envelope returned over HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur in the contact-intake service.
#[derive(Error, Debug)]
pub enum ContactError {
    /// One or more submitted fields failed validation
    #[error("{}", .0.headline())]
    Validation(ValidationErrors),

    /// A request argument (pagination, login payload, body shape) is out of bounds
    #[error("{0}")]
    InvalidArgument(String),

    /// Missing, invalid, expired or revoked credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// Too many requests from one client address
    #[error("{0}")]
    RateLimited(String),

    /// Requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// The record store was unreachable or rejected the operation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Anything unexpected
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Result with `ContactError`
pub type Result<T> = std::result::Result<T, ContactError>;

impl ContactError {
    /// HTTP status this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::RateLimited(_) => "rate_limited",
            Self::NotFound(_) => "not_found",
            Self::Persistence(_) => "persistence",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<ValidationErrors> for ContactError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<rusqlite::Error> for ContactError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<r2d2::Error> for ContactError {
    fn from(err: r2d2::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Self::Validation(errors) => json!({
                "ok": false,
                "error": errors.headline(),
                "details": errors.messages(),
            }),
            // Store and internal details stay in the logs
            Self::Persistence(detail) => {
                tracing::error!(error = %detail, "Record store failure");
                json!({ "ok": false, "error": "Failed to process request. Please try again later." })
            },
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Unexpected failure");
                json!({ "ok": false, "error": "Internal server error" })
            },
            other => json!({ "ok": false, "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
