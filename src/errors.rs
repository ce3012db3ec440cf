//! Structured error types with machine-readable codes
//!
//! Every failure surfaced to a caller is one of the variants below; nothing
//! is silently swallowed. Durability failures are the single exception to the
//! "surface everything" rule: a failed flush is retried once and then logged
//! as a warning (see `memory::persistence`), because in-memory state remains
//! authoritative and a later flush restores durability.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error response for API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// An operation referenced a session id the registry does not know.
    SessionNotFound(String),

    /// A mutation was attempted against a session frozen by `end_session`.
    SessionEnded(String),

    /// Malformed input: a bad session id, an inconsistent snapshot, or an
    /// out-of-range configured limit.
    Validation { field: String, reason: String },

    /// A snapshot carried a schema version this build does not understand.
    VersionMismatch { expected: u32, found: u32 },

    /// An internal tier bound was violated after a mutation. Never expected
    /// in correct operation; indicates a programming fault.
    CapacityInvariant {
        tier: &'static str,
        len: usize,
        limit: usize,
    },

    /// Generic wrapper for internal errors
    Internal(anyhow::Error),
}

impl AppError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::SessionEnded(_) => "SESSION_ENDED",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
            Self::CapacityInvariant { .. } => "CAPACITY_INVARIANT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionEnded(_) => StatusCode::CONFLICT,
            Self::Validation { .. } | Self::VersionMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::CapacityInvariant { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::SessionNotFound(id) => format!("Session not found: {id}"),
            Self::SessionEnded(id) => {
                format!("Session has ended and is read-only: {id}")
            }
            Self::Validation { field, reason } => {
                format!("Invalid input for field '{field}': {reason}")
            }
            Self::VersionMismatch { expected, found } => {
                format!("Snapshot schema version {found} is not supported (expected {expected})")
            }
            Self::CapacityInvariant { tier, len, limit } => {
                format!("Capacity invariant violated on tier '{tier}': len={len} limit={limit}")
            }
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }

    /// Convert to structured error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.message(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

/// Helper trait to convert validation errors
pub trait ValidationErrorExt<T> {
    fn map_validation_err(self, field: &str) -> Result<T>;
}

impl<T> ValidationErrorExt<T> for anyhow::Result<T> {
    fn map_validation_err(self, field: &str) -> Result<T> {
        self.map_err(|e| AppError::Validation {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;
