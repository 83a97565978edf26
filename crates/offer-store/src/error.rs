//! # Store Error Types
//!
//! Error types for the persisted counter state.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / serde_json::Error / ValidationError                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds the file path and a category          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  anyhow::Error (in the CLI) ← Printed to stderr, non-zero exit         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::path::PathBuf;

use offer_core::{CoreError, ValidationError};
use thiserror::Error;

/// Counter store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or creating a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The state file is not valid JSON.
    ///
    /// ## When This Occurs
    /// - File truncated by a crash of a tool that did not write atomically
    /// - File edited by hand
    #[error("Corrupt state file {path}: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    /// The state file is JSON but does not hold a usable counter.
    ///
    /// ## When This Occurs
    /// - `next` missing, negative or not an integer
    /// - Allocation would overflow the counter
    #[error("Invalid state in {path}: {reason}")]
    InvalidState { path: PathBuf, reason: String },

    /// The exclusive lock could not be acquired.
    #[error("Failed to lock {path}: {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Domain error from offer-core (bad count, bad config).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Creates an Io error for a given path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StoreError::InvalidState {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Core(CoreError::Validation(err))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
