//! Storage error types.

use cr_model::ModelError;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} '{key}' in realm '{realm}'")]
    NotFound {
        /// Type of entity (e.g., "User", "Group").
        entity_type: &'static str,
        /// Realm searched.
        realm: String,
        /// User id or group name.
        key: String,
    },

    /// Duplicate entity (the `(realm, key)` pair is taken).
    #[error("Duplicate {entity_type}: '{key}' already exists in realm '{realm}'")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Realm of the conflict.
        realm: String,
        /// Conflicting id or name.
        key: String,
    },

    /// An in-place update was refused by the change it applied.
    #[error("Update rejected: {0}")]
    Rejected(#[from] ModelError),

    /// Internal error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error for an entity.
    #[must_use]
    pub fn not_found(
        entity_type: &'static str,
        realm: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            entity_type,
            realm: realm.into(),
            key: key.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(
        entity_type: &'static str,
        realm: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity_type,
            realm: realm.into(),
            key: key.into(),
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error() {
        let err = StorageError::not_found("User", "corp", "alice");

        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
        assert!(err.to_string().contains("User"));
        assert!(err.to_string().contains("corp"));
    }

    #[test]
    fn duplicate_error() {
        let err = StorageError::duplicate("Group", "corp", "admins");

        assert!(err.is_duplicate());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("admins"));
    }

    #[test]
    fn rejected_wraps_model_error() {
        let err = StorageError::from(ModelError::AttributeNotFound("dept".into()));

        assert!(matches!(err, StorageError::Rejected(ModelError::AttributeNotFound(_))));
        assert!(err.to_string().contains("dept"));
    }
}
