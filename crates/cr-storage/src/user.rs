//! User repository trait.

use async_trait::async_trait;
use cr_model::User;

use crate::Change;
use crate::error::StorageResult;

/// Repository for user records, keyed by `(realm, id)`.
///
/// Implementations must be thread-safe and support concurrent access from
/// multiple authentication requests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by id.
    async fn get(&self, realm: &str, id: &str) -> StorageResult<Option<User>>;

    /// Creates a new user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if `(realm, id)` is taken.
    async fn create(&self, user: &User) -> StorageResult<()>;

    /// Replaces an existing user record.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn put(&self, user: &User) -> StorageResult<()>;

    /// Applies `change` to the stored user atomically and returns the result.
    ///
    /// Concurrent updates of the same user are serialized, so none of them
    /// is lost.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist, or
    /// `StorageError::Rejected` if `change` fails.
    async fn update(&self, realm: &str, id: &str, change: Change<'_, User>) -> StorageResult<User>;

    /// Deletes a user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn delete(&self, realm: &str, id: &str) -> StorageResult<()>;

    /// Lists user ids in a realm, sorted.
    async fn list_ids(&self, realm: &str) -> StorageResult<Vec<String>>;

    /// Lists realms that contain at least one user, sorted.
    async fn realms(&self) -> StorageResult<Vec<String>>;
}
