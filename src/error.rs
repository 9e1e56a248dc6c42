//! # Error Types
//!
//! This module defines error types used throughout the reolkode library.

use thiserror::Error;

/// Main error type for reolkode operations
#[derive(Debug, Error)]
pub enum ReolkodeError {
    /// Format, range or precondition violation in a caller-supplied value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// A font file was found but could not be parsed
    #[error("Font error: {0}")]
    Font(String),

    /// Label profile could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Asynchronous render was cancelled before it started
    #[error("Render cancelled")]
    Cancelled,

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReolkodeError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ReolkodeError::InvalidArgument(msg.into())
    }

    /// True for format/range/precondition violations.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ReolkodeError::InvalidArgument(_))
    }
}

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, ReolkodeError>;
