//! Error types for Protokol core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages.

use thiserror::Error;

/// Result type alias for Protokol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Core error type for Protokol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Data validation error (rejected before any store call)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Finalization precondition unmet
    #[error(transparent)]
    Gate(#[from] GateFailure),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

/// Specific unmet conditions reported by the finalization gate.
///
/// The whole batch is rejected when any entry fails any check; the
/// failure names the first offending entry so the operator knows what
/// to fix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateFailure {
    /// No entries were selected for finalization
    #[error("No entries selected")]
    EmptySelection,

    /// An entry lacks a staff signature on both legs
    #[error("Entry {index} has no staff signature on either leg")]
    MissingStaffSignature { index: usize },

    /// An entry is not pending in the queue chosen for the batch
    #[error("Entry {index} is not pending in the {queue} queue; entries have mixed or missing queue assignments")]
    QueueMismatch { index: usize, queue: String },

    /// An entry with identical content was already finalized
    #[error("Entry {index} was already added to the protocol")]
    AlreadyFinalized { index: usize },
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Validation(err.to_string())
    }
}

impl From<rusqlite::Error> for ProtocolError {
    fn from(err: rusqlite::Error) -> Self {
        ProtocolError::Storage(err.to_string())
    }
}
