//! Authentication orchestration.
//!
//! Composes user lookup, credential verification, account status checks and
//! role aggregation into a single [`Principal`]. The steps run in a fixed
//! order: the credential is checked strictly before the account status, so
//! an attacker without the password learns nothing about activation state.

use std::sync::Arc;

use cr_core::Config;
use cr_model::{Principal, User, VerificationMethod};
use cr_storage::{Change, GroupRepository, UserRepository};

use crate::credential::CredentialVerifier;
use crate::error::{AccountError, AuthError, AuthResult};
use crate::hierarchy::HierarchyResolver;
use crate::policy::PassphrasePolicy;

/// Password authenticator and credential changer.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    resolver: HierarchyResolver,
    verifier: CredentialVerifier,
    policy: PassphrasePolicy,
    method: VerificationMethod,
}

impl Authenticator {
    /// Creates an authenticator with default mask size, schemes, policy and
    /// Argon2id for new credentials.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self {
            users,
            resolver: HierarchyResolver::new(groups, cr_model::DEFAULT_MASK_WORDS),
            verifier: CredentialVerifier::with_defaults(),
            policy: PassphrasePolicy::default(),
            method: VerificationMethod::argon2id(),
        }
    }

    /// Creates an authenticator configured from `config`.
    #[must_use]
    pub fn from_config(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        config: &Config,
    ) -> Self {
        Self {
            users,
            resolver: HierarchyResolver::new(groups, config.role_mask_words),
            verifier: CredentialVerifier::with_defaults(),
            policy: PassphrasePolicy::for_kind(config.passphrase_policy),
            method: VerificationMethod::new(&config.verification_method),
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

    /// Sets the method used for new credentials.
    #[must_use]
    pub fn with_method(mut self, method: VerificationMethod) -> Self {
        self.method = method;
        self
    }

    /// Returns the credential verifier.
    #[must_use]
    pub const fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    /// Returns the hierarchy resolver.
    #[must_use]
    pub const fn resolver(&self) -> &HierarchyResolver {
        &self.resolver
    }

    /// Returns the passphrase policy.
    #[must_use]
    pub const fn policy(&self) -> &PassphrasePolicy {
        &self.policy
    }

    /// Returns the method used for new credentials.
    #[must_use]
    pub const fn method(&self) -> &VerificationMethod {
        &self.method
    }

    /// Authenticates a user by password.
    ///
    /// # Errors
    ///
    /// - `Validation` if realm, id or password is empty
    /// - `UserNotFound` if no such user exists
    /// - `Credential(InvalidCredential)` if the password does not match
    /// - `Account(NotActivated)` / `Account(Disabled)` for inactive accounts
    /// - `Storage` / `Model` if roles cannot be resolved
    pub async fn authenticate(&self, realm: &str, id: &str, password: &str) -> AuthResult<Principal> {
        if realm.is_empty() || id.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "realm, id and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.get(realm, id).await? else {
            tracing::debug!("Authentication failed for {} in realm {}: unknown user", id, realm);
            return Err(AuthError::UserNotFound);
        };

        if !self.verifier.verify_credential(&user.credential, password) {
            tracing::debug!("Authentication failed for {} in realm {}: bad credential", id, realm);
            return Err(AuthError::invalid_credential());
        }

        check_account(&user)?;

        if self.verifier.needs_rehash(&user.credential) {
            self.upgrade_credential(&user, password).await;
        }

        let roles = self.resolver.aggregate_user_roles(&user).await?;
        tracing::debug!("User {} authenticated in realm {}", id, realm);
        Ok(Principal::new(realm, id, roles))
    }

    /// Replaces a user's password using the configured method.
    ///
    /// # Errors
    ///
    /// See [`Authenticator::change_credential_with`].
    pub async fn change_credential(&self, realm: &str, id: &str, new_password: &str) -> AuthResult<()> {
        self.change_credential_with(realm, id, new_password, &self.method)
            .await
    }

    /// Replaces a user's password using an explicit method.
    ///
    /// The new method and hash are computed first and written together, so
    /// the stored record never pairs a new hash with an old method.
    ///
    /// # Errors
    ///
    /// - `Validation` if realm or id is empty
    /// - `PolicyViolation` if the password breaks the passphrase policy
    /// - `Credential(UnknownMethod | EmptyPassword)` from the verifier
    /// - `NotFound` if no such user exists
    pub async fn change_credential_with(
        &self,
        realm: &str,
        id: &str,
        new_password: &str,
        method: &VerificationMethod,
    ) -> AuthResult<()> {
        if realm.is_empty() || id.is_empty() {
            return Err(AuthError::Validation("realm and id are required".to_string()));
        }
        self.policy.check(new_password)?;

        let credential = self.verifier.credential(method, new_password)?;
        self.users
            .update(
                realm,
                id,
                Box::new(move |user: &mut User| {
                    user.set_credential(credential);
                    Ok(())
                }),
            )
            .await?;

        tracing::info!("Credential changed for {} in realm {} ({})", id, realm, method);
        Ok(())
    }

    /// Re-hashes a credential that verified under outdated cost settings.
    ///
    /// Failure is logged and never fails the login. The stored record is
    /// only replaced if it still holds the hash that was verified.
    async fn upgrade_credential(&self, user: &User, password: &str) {
        let credential = match self.verifier.credential(&user.credential.method, password) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!("Could not re-hash credential for {}: {}", user.id, e);
                return;
            }
        };

        let verified = user.credential.hash.clone();
        let change: Change<'_, User> = Box::new(move |stored: &mut User| {
            if stored.credential.hash == verified {
                stored.set_credential(credential);
            }
            Ok(())
        });
        match self.users.update(&user.realm, &user.id, change).await {
            Ok(_) => tracing::debug!("Credential re-hashed for {} in realm {}", user.id, user.realm),
            Err(e) => tracing::warn!("Could not store re-hashed credential for {}: {}", user.id, e),
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("resolver", &self.resolver)
            .field("verifier", &self.verifier)
            .field("policy", &self.policy)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

fn check_account(user: &User) -> AuthResult<()> {
    if !user.active {
        tracing::debug!("Authentication refused for {}: not activated", user.id);
        return Err(AccountError::NotActivated.into());
    }
    if !user.enabled {
        tracing::debug!("Authentication refused for {}: disabled", user.id);
        return Err(AccountError::Disabled.into());
    }
    Ok(())
}
