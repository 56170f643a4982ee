//! Error handling for credenta.
//!
//! This is the taxonomy exposed to callers that sit at an external boundary.
//! Crate-level errors (`AuthError`, `StorageError`, `TokenError`) convert into
//! it; authentication failures are collapsed into one generic variant so the
//! boundary never reveals whether an account exists.

use thiserror::Error;

/// Result type alias using the credenta error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for credenta operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Authentication error.
    ///
    /// Unknown users, wrong passwords and inactive or disabled accounts all
    /// map here with the same message to prevent user enumeration.
    #[error("authentication failed")]
    Authentication,

    /// Token could not be accepted.
    #[error("invalid token: {0}")]
    Token(String),

    /// Cryptographic error.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Validation error (malformed input, policy violations).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    /// Internal error.
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Storage(_) | Self::Crypto(_) | Self::Internal
        )
    }

    /// Returns whether this error represents a client error.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication
                | Self::Token(_)
                | Self::Validation(_)
                | Self::NotFound(_)
                | Self::AlreadyExists(_)
        )
    }
}
