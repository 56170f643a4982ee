//! In-memory repositories.
//!
//! Suitable for tests, embedding and single-process deployments. Records are
//! kept in a [`DashMap`] keyed by `(realm, key)`, so writers lock a single
//! shard and readers always observe a whole record.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use cr_model::{Group, User};

use crate::Change;
use crate::error::{StorageError, StorageResult};
use crate::group::GroupRepository;
use crate::user::UserRepository;

type Key = (String, String);

/// Realm-partitioned table shared by both repositories.
struct Table<T> {
    entity_type: &'static str,
    rows: DashMap<Key, T>,
}

impl<T: Clone> Table<T> {
    fn new(entity_type: &'static str) -> Self {
        Self {
            entity_type,
            rows: DashMap::new(),
        }
    }

    fn key(realm: &str, key: &str) -> Key {
        (realm.to_string(), key.to_string())
    }

    fn get(&self, realm: &str, key: &str) -> Option<T> {
        self.rows.get(&Self::key(realm, key)).map(|r| r.value().clone())
    }

    fn create(&self, realm: &str, key: &str, value: &T) -> StorageResult<()> {
        match self.rows.entry(Self::key(realm, key)) {
            Entry::Occupied(_) => Err(StorageError::duplicate(self.entity_type, realm, key)),
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                Ok(())
            }
        }
    }

    fn put(&self, realm: &str, key: &str, value: &T) -> StorageResult<()> {
        match self.rows.get_mut(&Self::key(realm, key)) {
            Some(mut row) => {
                *row = value.clone();
                Ok(())
            }
            None => Err(StorageError::not_found(self.entity_type, realm, key)),
        }
    }

    /// Edits a copy under the shard lock and stores it only if the change
    /// succeeds.
    fn update(&self, realm: &str, key: &str, change: Change<'_, T>) -> StorageResult<T> {
        let mut row = self
            .rows
            .get_mut(&Self::key(realm, key))
            .ok_or_else(|| StorageError::not_found(self.entity_type, realm, key))?;
        let mut next = row.value().clone();
        change(&mut next)?;
        *row = next.clone();
        Ok(next)
    }

    fn delete(&self, realm: &str, key: &str) -> StorageResult<()> {
        self.rows
            .remove(&Self::key(realm, key))
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(self.entity_type, realm, key))
    }

    fn keys(&self, realm: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .rows
            .iter()
            .filter(|r| r.key().0 == realm)
            .map(|r| r.key().1.clone())
            .collect();
        keys.sort();
        keys
    }

    fn realms(&self) -> Vec<String> {
        let mut realms: Vec<String> = self.rows.iter().map(|r| r.key().0.clone()).collect();
        realms.sort();
        realms.dedup();
        realms
    }
}

/// In-memory [`GroupRepository`].
pub struct InMemoryGroupRepository {
    table: Table<Group>,
}

impl InMemoryGroupRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Table::new("Group"),
        }
    }

    /// Number of stored groups across all realms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.rows.len()
    }

    /// Returns true if no groups are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.rows.is_empty()
    }
}

impl Default for InMemoryGroupRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn get(&self, realm: &str, name: &str) -> StorageResult<Option<Group>> {
        Ok(self.table.get(realm, name))
    }

    async fn create(&self, group: &Group) -> StorageResult<()> {
        self.table.create(&group.realm, &group.name, group)
    }

    async fn put(&self, group: &Group) -> StorageResult<()> {
        self.table.put(&group.realm, &group.name, group)
    }

    async fn update(
        &self,
        realm: &str,
        name: &str,
        change: Change<'_, Group>,
    ) -> StorageResult<Group> {
        self.table.update(realm, name, change)
    }

    async fn delete(&self, realm: &str, name: &str) -> StorageResult<()> {
        self.table.delete(realm, name)
    }

    async fn list_names(&self, realm: &str) -> StorageResult<Vec<String>> {
        Ok(self.table.keys(realm))
    }

    async fn realms(&self) -> StorageResult<Vec<String>> {
        Ok(self.table.realms())
    }
}

/// In-memory [`UserRepository`].
pub struct InMemoryUserRepository {
    table: Table<User>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Table::new("User"),
        }
    }

    /// Number of stored users across all realms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.rows.len()
    }

    /// Returns true if no users are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.rows.is_empty()
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, realm: &str, id: &str) -> StorageResult<Option<User>> {
        Ok(self.table.get(realm, id))
    }

    async fn create(&self, user: &User) -> StorageResult<()> {
        self.table.create(&user.realm, &user.id, user)
    }

    async fn put(&self, user: &User) -> StorageResult<()> {
        self.table.put(&user.realm, &user.id, user)
    }

    async fn update(&self, realm: &str, id: &str, change: Change<'_, User>) -> StorageResult<User> {
        self.table.update(realm, id, change)
    }

    async fn delete(&self, realm: &str, id: &str) -> StorageResult<()> {
        self.table.delete(realm, id)
    }

    async fn list_ids(&self, realm: &str) -> StorageResult<Vec<String>> {
        Ok(self.table.keys(realm))
    }

    async fn realms(&self) -> StorageResult<Vec<String>> {
        Ok(self.table.realms())
    }
}
