//! Error taxonomy shared by every request handler
//!
//! Each variant maps to one HTTP status and one machine-readable code so the
//! rendering boundary can tell the failure kinds apart. Storage failures are
//! the only kind marked as retryable.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result alias used across the crate.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range input, or a missing required id
    #[error("{0}")]
    Validation(String),

    /// A referenced photo or region does not exist
    #[error("{0}")]
    NotFound(String),

    /// The photo belongs to somebody else
    #[error("{0}")]
    Forbidden(String),

    /// The photo was taken in a different region than the one requested
    #[error("{0}")]
    Conflict(String),

    /// The acting user is missing or is not the map owner
    #[error("{0}")]
    Unauthorized(String),

    /// The embedded store failed; callers may retry
    #[error("storage unavailable: {0}")]
    Storage(#[from] redb::Error),

    /// A stored record could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Corrupt(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Storage(_) => "storage_unavailable",
            Self::Corrupt(_) => "corrupt_record",
            Self::Config(_) => "config_error",
        }
    }

    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }

        let mut body = json!({
            "error": self.to_string(),
            "code": code,
        });
        if self.is_retryable() {
            body["retryable"] = json!(true);
        }

        (status, Json(body)).into_response()
    }
}

// redb reports each phase of a transaction with its own error type; they all
// collapse into the transient storage kind.

impl From<redb::DatabaseError> for AppError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::TableError> for AppError {
    fn from(err: redb::TableError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(err: redb::StorageError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(err: redb::CommitError) -> Self {
        Self::Storage(err.into())
    }
}

// A body that does not deserialize is malformed input, never a conflict.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
