//! Result and error types for the ledger engine

use thiserror::Error;

/// Ledger engine error type
///
/// Validation and storage failures are distinct variants on purpose: a
/// storage outage must never be surfaced to a caller as if their input
/// were wrong.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input the caller can correct (negative amount, empty field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Username already taken; caller must pick another
    #[error("Username already exists")]
    DuplicateUsername,

    /// Generic login failure. Never says whether the username or the
    /// password was wrong.
    #[error("Invalid username or password")]
    AuthenticationFailed,

    /// Ledger call made without a valid session token
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Account id does not exist. After a successful login this is an
    /// internal consistency violation and should be logged, not swallowed.
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// Backing store unavailable or failing
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an unknown-account error
    pub fn unknown_account(id: impl Into<String>) -> Self {
        Self::UnknownAccount(id.into())
    }
}

/// Ledger engine result type
pub type Result<T> = std::result::Result<T, Error>;
