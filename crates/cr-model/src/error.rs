//! Model-level errors.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by value-level operations on domain entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Role id does not fit in the mask.
    #[error("role {role} is out of range for a mask of {capacity} roles")]
    RoleOutOfRange {
        /// Requested role id.
        role: u32,
        /// Number of addressable roles in the mask.
        capacity: usize,
    },

    /// Two masks of different lengths were combined.
    #[error("role mask length mismatch: expected {expected} words, got {actual}")]
    MaskLengthMismatch {
        /// Word count of the receiving mask.
        expected: usize,
        /// Word count of the other mask.
        actual: usize,
    },

    /// An attribute with the same (case-insensitive) name exists.
    #[error("attribute already exists: {0}")]
    AttributeExists(String),

    /// No attribute with the given name.
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// Invalid value for a model field.
    #[error("validation error: {0}")]
    Validation(String),
}
