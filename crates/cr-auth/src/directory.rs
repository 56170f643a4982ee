//! User and group administration.
//!
//! The directory service owns the write paths around the repositories:
//! creating users (with policy-checked, hashed credentials) and groups,
//! toggling account status, and managing roles, memberships and parents.
//! Every mutation is one atomic repository update of a single record, so
//! concurrent administrators never overwrite each other's changes.

use std::sync::Arc;

use cr_core::Config;
use cr_model::{Group, IdType, ModelResult, RoleId, User, VerificationMethod};
use cr_storage::{Change, GroupRepository, StorageError, UserRepository};

use crate::credential::CredentialVerifier;
use crate::error::{AuthError, AuthResult};
use crate::policy::PassphrasePolicy;

/// Request to create a user.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    /// Realm of the new user.
    pub realm: &'a str,
    /// User id.
    pub id: &'a str,
    /// Kind of identifier.
    pub id_type: IdType,
    /// Initial password.
    pub password: &'a str,
    /// Initial group memberships.
    pub groups: &'a [&'a str],
    /// Method for the credential; the service default when `None`.
    pub method: Option<VerificationMethod>,
}

impl<'a> NewUser<'a> {
    /// Creates a request with no groups and the default method.
    #[must_use]
    pub const fn new(realm: &'a str, id: &'a str, password: &'a str) -> Self {
        Self {
            realm,
            id,
            id_type: IdType::UserId,
            password,
            groups: &[],
            method: None,
        }
    }

    /// Sets the identifier kind.
    #[must_use]
    pub fn id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    /// Sets the initial groups.
    #[must_use]
    pub fn groups(mut self, groups: &'a [&'a str]) -> Self {
        self.groups = groups;
        self
    }

    /// Sets the verification method.
    #[must_use]
    pub fn method(mut self, method: VerificationMethod) -> Self {
        self.method = Some(method);
        self
    }
}

/// Administrative operations on users and groups.
#[derive(Clone)]
pub struct DirectoryService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    verifier: CredentialVerifier,
    policy: PassphrasePolicy,
    method: VerificationMethod,
    default_realm: String,
    mask_words: usize,
}

impl DirectoryService {
    /// Creates a service with default settings.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self::from_config(users, groups, &Config::default())
    }

    /// Creates a service configured from `config`.
    #[must_use]
    pub fn from_config(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        config: &Config,
    ) -> Self {
        Self {
            users,
            groups,
            verifier: CredentialVerifier::with_defaults(),
            policy: PassphrasePolicy::for_kind(config.passphrase_policy),
            method: VerificationMethod::new(&config.verification_method),
            default_realm: config.default_realm.clone(),
            mask_words: config.role_mask_words,
        }
    }

    /// Replaces the credential scheme table.
    #[must_use]
    pub fn with_verifier(mut self, verifier: CredentialVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Replaces the passphrase policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PassphrasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the realm used by the `*_default` operations.
    #[must_use]
    pub fn default_realm(&self) -> &str {
        &self.default_realm
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    /// Creates and stores a new user.
    ///
    /// The user starts enabled but not active.
    ///
    /// # Errors
    ///
    /// - `Validation` if realm, id or password is empty
    /// - `PolicyViolation` if the password breaks the passphrase policy
    /// - `Credential(UnknownMethod)` for an unregistered method
    /// - `AlreadyExists` if `(realm, id)` is taken
    pub async fn create_user(&self, request: NewUser<'_>) -> AuthResult<User> {
        if request.realm.is_empty() || request.id.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation(
                "realm, id and password are required".to_string(),
            ));
        }
        self.policy.check(request.password)?;

        let method = request.method.unwrap_or_else(|| self.method.clone());
        let credential = self.verifier.credential(&method, request.password)?;

        let mut user = User::new(request.realm, request.id, request.id_type, self.mask_words)
            .with_credential(credential);
        for group in request.groups {
            user.join_group(*group);
        }

        self.users.create(&user).await?;
        tracing::info!("Created user {} in realm {}", user.id, user.realm);
        Ok(user)
    }

    /// Creates a user in the default realm.
    ///
    /// # Errors
    ///
    /// See [`DirectoryService::create_user`].
    pub async fn create_default_user(&self, id: &str, password: &str) -> AuthResult<User> {
        self.create_user(NewUser::new(&self.default_realm, id, password))
            .await
    }

    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_user(&self, realm: &str, id: &str) -> AuthResult<User> {
        require(realm, id)?;
        self.users
            .get(realm, id)
            .await?
            .ok_or_else(|| StorageError::not_found("User", realm, id).into())
    }

    /// Loads a user from the default realm.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_default_user(&self, id: &str) -> AuthResult<User> {
        self.get_user(&self.default_realm, id).await
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn delete_user(&self, realm: &str, id: &str) -> AuthResult<()> {
        require(realm, id)?;
        self.users.delete(realm, id).await?;
        tracing::info!("Deleted user {} in realm {}", id, realm);
        Ok(())
    }

    /// Applies `change` to a stored user atomically and returns the result.
    ///
    /// Nothing is written if `change` fails.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, or `Model` with the error of `change`.
    pub async fn modify_user<F>(&self, realm: &str, id: &str, change: F) -> AuthResult<User>
    where
        F: FnOnce(&mut User) -> ModelResult<()> + Send,
    {
        require(realm, id)?;
        let change: Change<'_, User> = Box::new(move |user: &mut User| {
            change(user)?;
            user.touch();
            Ok(())
        });
        Ok(self.users.update(realm, id, change).await?)
    }

    /// Marks a user active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn activate_user(&self, realm: &str, id: &str) -> AuthResult<User> {
        self.modify_user(realm, id, |u| {
            u.active = true;
            Ok(())
        })
        .await
    }

    /// Enables or disables a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn set_user_enabled(&self, realm: &str, id: &str, enabled: bool) -> AuthResult<User> {
        self.modify_user(realm, id, |u| {
            u.enabled = enabled;
            Ok(())
        })
        .await
    }

    /// Grants a role directly to a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Model(RoleOutOfRange)`.
    pub async fn grant_user_role(&self, realm: &str, id: &str, role: RoleId) -> AuthResult<User> {
        self.modify_user(realm, id, |u| u.grant_role(role))
            .await
    }

    /// Revokes a role granted directly to a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Model(RoleOutOfRange)`.
    pub async fn revoke_user_role(&self, realm: &str, id: &str, role: RoleId) -> AuthResult<User> {
        self.modify_user(realm, id, |u| u.revoke_role(role))
            .await
    }

    /// Adds a user to an existing group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the group or the user is absent.
    pub async fn add_user_to_group(&self, realm: &str, id: &str, group: &str) -> AuthResult<User> {
        self.get_group(realm, group).await?;
        self.modify_user(realm, id, |u| {
            u.join_group(group);
            Ok(())
        })
        .await
    }

    /// Removes a user from a group. The group need not exist any more.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn remove_user_from_group(
        &self,
        realm: &str,
        id: &str,
        group: &str,
    ) -> AuthResult<User> {
        self.modify_user(realm, id, |u| {
            u.leave_group(group);
            Ok(())
        })
        .await
    }

    /// Lists user ids in a realm.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list_user_ids(&self, realm: &str) -> AuthResult<Vec<String>> {
        Ok(self.users.list_ids(realm).await?)
    }

    /// Lists realms containing users.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn user_realms(&self) -> AuthResult<Vec<String>> {
        Ok(self.users.realms().await?)
    }

    // ---------------------------------------------------------------------
    // Groups
    // ---------------------------------------------------------------------

    /// Creates and stores a new group.
    ///
    /// Parents are recorded by name and need not exist yet.
    ///
    /// # Errors
    ///
    /// - `Validation` if realm or name is empty
    /// - `AlreadyExists` if `(realm, name)` is taken
    pub async fn create_group(&self, realm: &str, name: &str, parents: &[&str]) -> AuthResult<Group> {
        require(realm, name)?;

        let mut group = Group::new(realm, name, self.mask_words);
        for parent in parents {
            group.add_parent(*parent);
        }

        self.groups.create(&group).await?;
        tracing::info!("Created group {} in realm {}", name, realm);
        Ok(group)
    }

    /// Creates a group in the default realm.
    ///
    /// # Errors
    ///
    /// See [`DirectoryService::create_group`].
    pub async fn create_default_group(&self, name: &str, parents: &[&str]) -> AuthResult<Group> {
        self.create_group(&self.default_realm, name, parents).await
    }

    /// Loads a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_group(&self, realm: &str, name: &str) -> AuthResult<Group> {
        require(realm, name)?;
        self.groups
            .get(realm, name)
            .await?
            .ok_or_else(|| StorageError::not_found("Group", realm, name).into())
    }

    /// Loads a group from the default realm.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_default_group(&self, name: &str) -> AuthResult<Group> {
        self.get_group(&self.default_realm, name).await
    }

    /// Deletes a group. References to it from users and child groups stay
    /// and resolve to no roles.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn delete_group(&self, realm: &str, name: &str) -> AuthResult<()> {
        require(realm, name)?;
        self.groups.delete(realm, name).await?;
        tracing::info!("Deleted group {} in realm {}", name, realm);
        Ok(())
    }

    /// Applies `change` to a stored group atomically and returns the result.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, or `Model` with the error of `change`.
    pub async fn modify_group<F>(&self, realm: &str, name: &str, change: F) -> AuthResult<Group>
    where
        F: FnOnce(&mut Group) -> ModelResult<()> + Send,
    {
        require(realm, name)?;
        let change: Change<'_, Group> = Box::new(move |group: &mut Group| {
            change(group)?;
            group.touch();
            Ok(())
        });
        Ok(self.groups.update(realm, name, change).await?)
    }

    /// Grants a role to a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Model(RoleOutOfRange)`.
    pub async fn grant_group_role(&self, realm: &str, name: &str, role: RoleId) -> AuthResult<Group> {
        self.modify_group(realm, name, |g| g.grant_role(role))
            .await
    }

    /// Revokes a role from a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Model(RoleOutOfRange)`.
    pub async fn revoke_group_role(
        &self,
        realm: &str,
        name: &str,
        role: RoleId,
    ) -> AuthResult<Group> {
        self.modify_group(realm, name, |g| g.revoke_role(role))
            .await
    }

    /// Adds a parent to a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the group is absent.
    pub async fn add_group_parent(&self, realm: &str, name: &str, parent: &str) -> AuthResult<Group> {
        if parent.is_empty() {
            return Err(AuthError::Validation("parent name is required".to_string()));
        }
        self.modify_group(realm, name, |g| {
            g.add_parent(parent);
            Ok(())
        })
        .await
    }

    /// Removes a parent from a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the group is absent.
    pub async fn remove_group_parent(
        &self,
        realm: &str,
        name: &str,
        parent: &str,
    ) -> AuthResult<Group> {
        self.modify_group(realm, name, |g| {
            g.remove_parent(parent);
            Ok(())
        })
        .await
    }

    /// Lists group names in a realm.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list_group_names(&self, realm: &str) -> AuthResult<Vec<String>> {
        Ok(self.groups.list_names(realm).await?)
    }

    /// Lists realms containing groups.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn group_realms(&self) -> AuthResult<Vec<String>> {
        Ok(self.groups.realms().await?)
    }
}

impl std::fmt::Debug for DirectoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryService")
            .field("default_realm", &self.default_realm)
            .field("mask_words", &self.mask_words)
            .field("method", &self.method)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn require(realm: &str, key: &str) -> AuthResult<()> {
    if realm.is_empty() || key.is_empty() {
        return Err(AuthError::Validation("realm and key are required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cr_model::{Attributable, AttributeValue, ModelError};
    use cr_storage::{InMemoryGroupRepository, InMemoryUserRepository};

    use super::*;
    use crate::error::CredentialError;
    use crate::password::Argon2Settings;

    fn service() -> DirectoryService {
        DirectoryService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryGroupRepository::new()),
        )
        .with_verifier(CredentialVerifier::with_argon2(
            Argon2Settings::new().memory_cost(1024).time_cost(1),
        ))
    }

    #[tokio::test]
    async fn create_user_hashes_and_starts_inactive() {
        let dir = service();

        let user = dir
            .create_user(NewUser::new("corp", "alice", "password1").groups(&["staff"]))
            .await
            .unwrap();

        assert!(user.enabled);
        assert!(!user.active);
        assert_eq!(user.groups, vec!["staff"]);
        assert_eq!(user.credential.method.as_str(), "ARGON");
        assert!(user.credential.hash.starts_with("$argon2id$"));
        assert!(dir.verifier.verify_credential(&user.credential, "password1"));

        let stored = dir.get_user("corp", "alice").await.unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn create_user_rejections() {
        let dir = service();

        assert!(matches!(
            dir.create_user(NewUser::new("", "alice", "password1")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            dir.create_user(NewUser::new("corp", "alice", "")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            dir.create_user(NewUser::new("corp", "alice", "short")).await,
            Err(AuthError::PolicyViolation(_))
        ));
        assert!(matches!(
            dir.create_user(
                NewUser::new("corp", "alice", "password1").method(VerificationMethod::new("ROT13"))
            )
            .await,
            Err(AuthError::Credential(CredentialError::UnknownMethod(_)))
        ));

        dir.create_user(NewUser::new("corp", "alice", "password1"))
            .await
            .unwrap();
        assert!(matches!(
            dir.create_user(NewUser::new("corp", "alice", "password2")).await,
            Err(AuthError::AlreadyExists(_))
        ));
        // Same id in another realm is a different user.
        dir.create_user(NewUser::new("lab", "alice", "password1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn default_realm_variants() {
        let dir = service();

        dir.create_default_group("staff", &[]).await.unwrap();
        dir.create_default_user("bob", "password1").await.unwrap();

        assert_eq!(dir.get_default_user("bob").await.unwrap().realm, "DEFAULT");
        assert_eq!(dir.get_default_group("staff").await.unwrap().realm, "DEFAULT");
        assert_eq!(dir.user_realms().await.unwrap(), vec!["DEFAULT"]);
        assert_eq!(dir.group_realms().await.unwrap(), vec!["DEFAULT"]);
    }

    #[tokio::test]
    async fn status_and_roles() {
        let dir = service();
        dir.create_user(NewUser::new("corp", "alice", "password1").id_type(IdType::Email))
            .await
            .unwrap();

        let user = dir.activate_user("corp", "alice").await.unwrap();
        assert!(user.can_authenticate());
        let user = dir.set_user_enabled("corp", "alice", false).await.unwrap();
        assert!(!user.can_authenticate());

        let user = dir.grant_user_role("corp", "alice", 65).await.unwrap();
        assert!(user.has_role(65).unwrap());
        let user = dir.revoke_user_role("corp", "alice", 65).await.unwrap();
        assert!(!user.has_role(65).unwrap());

        assert!(matches!(
            dir.grant_user_role("corp", "alice", 640).await,
            Err(AuthError::Model(ModelError::RoleOutOfRange { .. }))
        ));
        assert!(matches!(
            dir.activate_user("corp", "nobody").await,
            Err(AuthError::NotFound(msg)) if msg.contains("nobody")
        ));
    }

    #[tokio::test]
    async fn memberships_require_existing_group() {
        let dir = service();
        dir.create_user(NewUser::new("corp", "alice", "password1"))
            .await
            .unwrap();

        assert!(matches!(
            dir.add_user_to_group("corp", "alice", "staff").await,
            Err(AuthError::NotFound(msg)) if msg.contains("staff")
        ));

        dir.create_group("corp", "staff", &[]).await.unwrap();
        let user = dir.add_user_to_group("corp", "alice", "staff").await.unwrap();
        assert!(user.is_member_of("staff"));

        // Removing works even after the group is gone.
        dir.delete_group("corp", "staff").await.unwrap();
        let user = dir
            .remove_user_from_group("corp", "alice", "staff")
            .await
            .unwrap();
        assert!(user.groups.is_empty());
    }

    #[tokio::test]
    async fn group_lifecycle() {
        let dir = service();

        let group = dir.create_group("corp", "ops", &["staff"]).await.unwrap();
        assert_eq!(group.parent_groups, vec!["staff"]);
        assert!(matches!(
            dir.create_group("corp", "ops", &[]).await,
            Err(AuthError::AlreadyExists(_))
        ));
        assert!(matches!(
            dir.create_group("corp", "", &[]).await,
            Err(AuthError::Validation(_))
        ));

        dir.grant_group_role("corp", "ops", 3).await.unwrap();
        let group = dir.add_group_parent("corp", "ops", "admins").await.unwrap();
        assert_eq!(group.parent_groups, vec!["staff", "admins"]);
        let group = dir.remove_group_parent("corp", "ops", "staff").await.unwrap();
        assert_eq!(group.parent_groups, vec!["admins"]);
        let group = dir.revoke_group_role("corp", "ops", 3).await.unwrap();
        assert!(group.role_mask.is_empty());

        let group = dir
            .modify_group("corp", "ops", |g| {
                g.set_attribute("cost-center", AttributeValue::Integer(42))
            })
            .await
            .unwrap();
        assert_eq!(group.attribute("COST-CENTER").unwrap().as_integer(), Some(42));

        assert_eq!(dir.list_group_names("corp").await.unwrap(), vec!["ops"]);
        dir.delete_group("corp", "ops").await.unwrap();
        assert!(matches!(
            dir.delete_group("corp", "ops").await,
            Err(AuthError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_user() {
        let dir = service();
        dir.create_user(NewUser::new("corp", "alice", "password1"))
            .await
            .unwrap();

        dir.delete_user("corp", "alice").await.unwrap();
        assert!(dir.list_user_ids("corp").await.unwrap().is_empty());
        assert!(matches!(
            dir.delete_user("corp", "alice").await,
            Err(AuthError::NotFound(_))
        ));
        let err = dir.get_user("corp", "alice").await.unwrap_err();
        assert!(!err.is_authentication_failure());
        assert!(matches!(cr_core::Error::from(err), cr_core::Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_grants_are_all_kept() {
        let dir = Arc::new(service());
        dir.create_user(NewUser::new("corp", "alice", "password1"))
            .await
            .unwrap();
        dir.create_group("corp", "ops", &[]).await.unwrap();

        let mut handles = Vec::new();
        for role in 0..48 {
            let dir = Arc::clone(&dir);
            handles.push(tokio::spawn(async move {
                dir.grant_user_role("corp", "alice", role).await?;
                dir.grant_group_role("corp", "ops", role).await?;
                Ok::<_, AuthError>(())
            }));
        }
        let toggler = {
            let dir = Arc::clone(&dir);
            tokio::spawn(async move { dir.activate_user("corp", "alice").await })
        };
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        toggler.await.unwrap().unwrap();

        let user = dir.get_user("corp", "alice").await.unwrap();
        let group = dir.get_group("corp", "ops").await.unwrap();
        assert!(user.active);
        assert_eq!(user.role_mask.roles().count(), 48);
        assert_eq!(group.role_mask.roles().count(), 48);
    }

    #[tokio::test]
    async fn failed_change_writes_nothing() {
        let dir = service();
        dir.create_group("corp", "ops", &[]).await.unwrap();
        let before = dir.get_group("corp", "ops").await.unwrap();

        let result = dir
            .modify_group("corp", "ops", |g| {
                g.add_parent("staff");
                g.grant_role(10_000)
            })
            .await;
        assert!(matches!(result, Err(AuthError::Model(ModelError::RoleOutOfRange { .. }))));
        assert_eq!(dir.get_group("corp", "ops").await.unwrap(), before);
    }
}
