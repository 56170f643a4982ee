//! Authentication error types.
//!
//! Errors are fully distinguished here so callers and logs can tell an unknown
//! user from a wrong password. Converting into [`cr_core::Error`] collapses
//! those into one generic authentication failure for external boundaries.

use std::fmt;

use cr_model::ModelError;
use cr_storage::StorageError;

/// Credential-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No scheme is registered for the method tag.
    UnknownMethod(String),
    /// A credential cannot be created from an empty password.
    EmptyPassword,
    /// The presented password does not match the stored hash.
    InvalidCredential,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMethod(method) => write!(f, "unknown verification method: {method}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::InvalidCredential => write!(f, "invalid credentials"),
        }
    }
}

/// Account status failures, checked after the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountError {
    /// The account is disabled.
    Disabled,
    /// The account has not been activated yet.
    NotActivated,
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "user account is disabled"),
            Self::NotActivated => write!(f, "user account is not activated"),
        }
    }
}

/// Authentication and directory operation errors.
#[derive(Debug)]
pub enum AuthError {
    /// Malformed input (empty realm, id, name).
    Validation(String),
    /// Login named a user that does not exist.
    UserNotFound,
    /// A directory operation addressed a user or group that does not exist.
    NotFound(String),
    /// Credential failure.
    Credential(CredentialError),
    /// Account status failure.
    Account(AccountError),
    /// Password rejected by the passphrase policy.
    PolicyViolation(String),
    /// Entity already exists.
    AlreadyExists(String),
    /// Model-level failure (role out of range, attribute conflicts).
    Model(ModelError),
    /// Storage backend failure.
    Storage(StorageError),
    /// Internal error.
    Internal(String),
}

impl AuthError {
    /// Shorthand for [`CredentialError::InvalidCredential`].
    #[must_use]
    pub const fn invalid_credential() -> Self {
        Self::Credential(CredentialError::InvalidCredential)
    }

    /// Checks if this error must be reported as a generic login failure.
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound
                | Self::Credential(CredentialError::InvalidCredential)
                | Self::Account(_)
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::UserNotFound => write!(f, "user not found"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Credential(err) => write!(f, "{err}"),
            Self::Account(err) => write!(f, "{err}"),
            Self::PolicyViolation(msg) => write!(f, "password policy violation: {msg}"),
            Self::AlreadyExists(what) => write!(f, "already exists: {what}"),
            Self::Model(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        Self::Credential(err)
    }
}

impl From<AccountError> for AuthError {
    fn from(err: AccountError) -> Self {
        Self::Account(err)
    }
}

impl From<ModelError> for AuthError {
    fn from(err: ModelError) -> Self {
        Self::Model(err)
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { .. } => Self::AlreadyExists(err.to_string()),
            StorageError::NotFound { .. } => Self::NotFound(err.to_string()),
            StorageError::Rejected(model) => Self::Model(model),
            other => Self::Storage(other),
        }
    }
}

impl From<AuthError> for cr_core::Error {
    fn from(err: AuthError) -> Self {
        if err.is_authentication_failure() {
            return Self::Authentication;
        }
        match err {
            AuthError::Validation(msg) | AuthError::PolicyViolation(msg) => Self::Validation(msg),
            AuthError::Credential(other) => Self::Validation(other.to_string()),
            AuthError::Model(model) => Self::Validation(model.to_string()),
            AuthError::NotFound(what) => Self::NotFound(what),
            AuthError::AlreadyExists(what) => Self::AlreadyExists(what),
            AuthError::Storage(storage) => Self::Storage(storage.to_string()),
            AuthError::Internal(_)
            | AuthError::UserNotFound
            | AuthError::Account(_) => Self::Internal,
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
