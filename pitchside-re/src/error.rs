//! Error types for pitchside-re
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Individual persistence failures are deliberately absent: they never surface as
//! errors, they become a per-member Failed status instead.

use pitchside_common::MemberId;
use thiserror::Error;

/// Main error type for the rating editor
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request (out-of-bounds rating, empty bulk selection, no overrides)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Actor lacks edit capability
    #[error("Not permitted: actor cannot edit ratings")]
    NotPermitted,

    /// A bulk apply run is already in progress
    #[error("Bulk apply already in progress")]
    BulkInProgress,

    /// Member is not part of the loaded roster
    #[error("Unknown member: {0}")]
    UnknownMember(MemberId),

    /// Editing session was torn down
    #[error("Editor session closed")]
    Closed,

    /// Roster, rating snapshot or audit history could not be fetched
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Background task failed to complete
    #[error("Internal error: {0}")]
    Internal(String),

    /// Errors from the shared library
    #[error(transparent)]
    Common(#[from] pitchside_common::Error),
}

/// Convenience Result type using pitchside-re Error
pub type Result<T> = std::result::Result<T, Error>;
