//! # DomainError
//!
//! Centralized error handling for the feedback board.
//! Each external system has its own error type; all of them fold into
//! `DomainError` at the service boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The primary error type for all board operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Resource not found (e.g., board index row, feedback item)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Local validation failure; raised before any I/O
    #[error("validation error: {0}")]
    Validation(String),

    /// The board is archived and accepts no further contributions
    #[error("board {0} is archived")]
    Archived(String),

    /// The actor is not allowed to perform this action (self-vote, double vote)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The index pointer kept moving underneath us
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A specialized Result type for board logic.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Failures raised by a content-addressed store.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("content storage is not configured")]
    Disabled,

    #[error("content upload failed: {0}")]
    Upload(String),

    #[error("content store returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("content serialization failed: {0}")]
    Serialization(String),
}

/// Failures raised by the relational index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("index store is not configured")]
    Disabled,

    #[error("index row already exists for board {0}")]
    Duplicate(String),

    #[error("index store returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("index store unavailable: {0}")]
    Unavailable(String),
}

/// Closed set of ledger failure categories.
///
/// Provider-specific payloads are mapped onto these once, at the ledger
/// adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerErrorKind {
    InsufficientBalance,
    Rejected,
    Network,
    SimulationFailed,
    Other,
}

/// A ledger failure with its classified kind and the raw provider message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ledger error ({kind:?}): {message}")]
pub struct LedgerError {
    pub kind: LedgerErrorKind,
    pub message: String,
}

impl LedgerError {
    pub fn new(kind: LedgerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
