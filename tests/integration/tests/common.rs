//! Common test utilities and fixtures.
//!
//! [`TestEnv`] wires the in-memory repositories to a directory service, an
//! authenticator and a token service signing with the fixture RSA keys.

use std::sync::Arc;

use cr_auth::{
    Argon2Settings, Authenticator, CredentialVerifier, DirectoryService, NewUser,
};
use cr_model::{Group, RoleId, User, VerificationMethod};
use cr_storage::{InMemoryGroupRepository, InMemoryUserRepository};
use cr_token::{SigningKey, TokenAlgorithm, TokenService, VerifyingKey};

/// Realm used by the scenarios.
pub const REALM: &str = "corp";

/// Issuer used by the token service.
pub const ISSUER: &str = "https://id.credenta.test";

const SIGNING_PEM: &[u8] = include_bytes!("../../../crates/cr-token/fixtures/signing_key.pem");
const VERIFYING_PEM: &[u8] = include_bytes!("../../../crates/cr-token/fixtures/verifying_key.pem");

/// Test environment over in-memory storage.
pub struct TestEnv {
    /// User records.
    pub users: Arc<InMemoryUserRepository>,
    /// Group records.
    pub groups: Arc<InMemoryGroupRepository>,
    /// Administration.
    pub directory: DirectoryService,
    /// Login.
    pub auth: Authenticator,
    /// Tokens.
    pub tokens: TokenService,
}

impl TestEnv {
    /// Creates an empty environment.
    pub fn new() -> anyhow::Result<Self> {
        cr_core::telemetry::init_tracing("cr_auth=debug,cr_token=debug");

        let users = Arc::new(InMemoryUserRepository::new());
        let groups = Arc::new(InMemoryGroupRepository::new());
        let verifier = fast_verifier();

        let directory = DirectoryService::new(users.clone(), groups.clone())
            .with_verifier(verifier.clone());
        let auth = Authenticator::new(users.clone(), groups.clone()).with_verifier(verifier);
        let tokens = TokenService::new(
            ISSUER,
            SigningKey::from_pem(TokenAlgorithm::Rs256, SIGNING_PEM)?,
            VerifyingKey::from_pem(TokenAlgorithm::Rs256, VERIFYING_PEM)?,
        );

        Ok(Self {
            users,
            groups,
            directory,
            auth,
            tokens,
        })
    }

    /// Creates a group in [`REALM`] holding `roles`.
    pub async fn group(&self, name: &str, parents: &[&str], roles: &[RoleId]) -> anyhow::Result<Group> {
        let mut group = self.directory.create_group(REALM, name, parents).await?;
        for role in roles {
            group = self.directory.grant_group_role(REALM, name, *role).await?;
        }
        Ok(group)
    }

    /// Creates an activated user in [`REALM`].
    pub async fn active_user(&self, id: &str, password: &str, groups: &[&str]) -> anyhow::Result<User> {
        self.user_with_method(id, password, groups, VerificationMethod::argon2id())
            .await
    }

    /// Creates an activated user in [`REALM`] whose credential uses `method`.
    pub async fn user_with_method(
        &self,
        id: &str,
        password: &str,
        groups: &[&str],
        method: VerificationMethod,
    ) -> anyhow::Result<User> {
        self.directory
            .create_user(NewUser::new(REALM, id, password).groups(groups).method(method))
            .await?;
        Ok(self.directory.activate_user(REALM, id).await?)
    }
}

/// A verifier whose Argon2 cost is low enough for tests.
fn fast_verifier() -> CredentialVerifier {
    CredentialVerifier::with_argon2(Argon2Settings::new().memory_cost(1024).time_cost(1))
}
