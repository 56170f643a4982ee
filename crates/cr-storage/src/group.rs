//! Group repository trait.

use async_trait::async_trait;
use cr_model::Group;

use crate::Change;
use crate::error::StorageResult;

/// Repository for group records, keyed by `(realm, name)`.
///
/// Implementations must be thread-safe and give a consistent point-in-time
/// read per call; the hierarchy resolver issues many concurrent `get`s.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Gets a group by name.
    async fn get(&self, realm: &str, name: &str) -> StorageResult<Option<Group>>;

    /// Creates a new group.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if `(realm, name)` is taken.
    async fn create(&self, group: &Group) -> StorageResult<()>;

    /// Replaces an existing group.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the group doesn't exist.
    async fn put(&self, group: &Group) -> StorageResult<()>;

    /// Applies `change` to the stored group atomically and returns the result.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the group doesn't exist, or
    /// `StorageError::Rejected` if `change` fails.
    async fn update(
        &self,
        realm: &str,
        name: &str,
        change: Change<'_, Group>,
    ) -> StorageResult<Group>;

    /// Deletes a group.
    ///
    /// Memberships and parent references naming it are left in place; they
    /// resolve to nothing from then on.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the group doesn't exist.
    async fn delete(&self, realm: &str, name: &str) -> StorageResult<()>;

    /// Lists group names in a realm, sorted.
    async fn list_names(&self, realm: &str) -> StorageResult<Vec<String>>;

    /// Lists realms that contain at least one group, sorted.
    async fn realms(&self) -> StorageResult<Vec<String>>;
}
