//! Session store error types

use thiserror::Error;

/// Errors that can occur while reading or writing session identity
#[derive(Error, Debug)]
pub enum SessionError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be parsed or written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Keychain access error
    #[error("Keychain error: {0}")]
    Keychain(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type for session store operations
pub type SessionResult<T> = Result<T, SessionError>;
