//! Token error types.

use thiserror::Error;

use crate::claims::TokenType;

/// Token issuance and validation errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token cannot be parsed.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not verify under the given key.
    #[error("token signature is invalid")]
    BadSignature,

    /// The token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// The token is not valid yet.
    #[error("token is not yet valid")]
    NotYetValid,

    /// The token has the wrong type for the operation.
    #[error("expected {expected} token, got {actual}")]
    WrongTokenType {
        /// Type the operation requires.
        expected: TokenType,
        /// Type the token carries.
        actual: TokenType,
    },

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// A key could not be loaded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The signing algorithm is not supported.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A lifetime is not positive, or puts the expiry past the last
    /// representable instant.
    #[error("token lifetime out of range: {0}")]
    LifetimeOutOfRange(String),
}

impl TokenError {
    /// Returns whether the error rejects a presented token, as opposed to a
    /// local key or signing failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Malformed(_)
                | Self::BadSignature
                | Self::Expired
                | Self::NotYetValid
                | Self::WrongTokenType { .. }
        )
    }
}

impl From<TokenError> for cr_core::Error {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::UnsupportedAlgorithm(_) | TokenError::LifetimeOutOfRange(_) => {
                Self::Config(err.to_string())
            }
            TokenError::Signing(_) | TokenError::InvalidKey(_) => Self::Crypto(err.to_string()),
            _ => Self::Token(err.to_string()),
        }
    }
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;
