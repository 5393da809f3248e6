//! Common error types for ClinCura
//!
//! The five client-facing categories (NotFound, Forbidden, Validation,
//! Conflict, InvalidReference) are distinct variants so the API layer can map
//! each to its own status code and the caller can tell "someone else changed
//! this" apart from "you're missing required evidence".

use crate::models::Curation;
use serde::Serialize;
use thiserror::Error;

/// Common result type for ClinCura operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ClinCura services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed UUID in a stored TEXT column
    #[error("Invalid UUID: {0}")]
    Uuid(#[from] uuid::Error),

    /// Malformed timestamp in a stored TEXT column
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record or referenced entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tenant access gate denial. The message is deliberately constant and
    /// existence-neutral: a record the actor cannot see and a record that
    /// does not exist produce the same response.
    #[error("not authorized")]
    Forbidden,

    /// Workflow precondition not met; carries the specific unmet condition(s)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Optimistic-lock mismatch; carries the winner's persisted state so the
    /// caller can drive merge/retry. Never auto-resolved server side.
    #[error("Lock conflict: submitted version {} but current version is {}",
            .0.your_lock_version, .0.current_lock_version)]
    Conflict(Box<LockConflict>),

    /// A create request names a gene/scope/workflow-pair that does not exist;
    /// rejected before any row is written
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payload of an optimistic-lock conflict.
///
/// Echoes both versions plus the authoritative current record so clients can
/// present a merge UI instead of blindly retrying.
#[derive(Debug, Clone, Serialize)]
pub struct LockConflict {
    pub current_lock_version: i64,
    pub your_lock_version: i64,
    pub current: Curation,
}

impl Error {
    /// Construct a conflict error from the winning record and the stale
    /// version the caller submitted.
    pub fn lock_conflict(current: Curation, your_lock_version: i64) -> Self {
        Error::Conflict(Box::new(LockConflict {
            current_lock_version: current.lock_version,
            your_lock_version,
            current,
        }))
    }
}
