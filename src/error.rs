//! Error types for tripledelta
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for tripledelta operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration / Input Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Update Rejections (payload: the offending triple, rendered)
    // -------------------------------------------------------------------------
    #[error("Triple {0} is already pending insertion")]
    AlreadyInserted(String),

    #[error("Triple {0} is already pending deletion")]
    AlreadyDeleted(String),

    #[error("Triple {0} already exists in the index")]
    AlreadyExistsInIndex(String),

    #[error("Triple {0} exists neither in the index nor in the pending insertions")]
    DoesNotExist(String),
}

impl StoreError {
    /// True for the four rejections of an insert or delete request.
    ///
    /// These leave the overlay untouched and are never worth retrying.
    pub fn is_update_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::AlreadyInserted(_)
                | StoreError::AlreadyDeleted(_)
                | StoreError::AlreadyExistsInIndex(_)
                | StoreError::DoesNotExist(_)
        )
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
