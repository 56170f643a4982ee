//! Authentication flow integration tests.

use cr_auth::{AccountError, AuthError, CredentialError};
use cr_model::VerificationMethod;
use cr_storage::UserRepository;
use cr_token::REALM_CLAIM;

use crate::common::{REALM, TestEnv};

/// Login through a three-level hierarchy, then token issuance.
#[tokio::test]
async fn test_login_resolves_inherited_roles() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    env.group("Elder", &[], &[0]).await?;
    env.group("Son", &["Elder"], &[1]).await?;
    env.group("Grandson", &["Son"], &[2]).await?;
    env.active_user("alice", "password1", &["Grandson"]).await?;
    env.directory.grant_user_role(REALM, "alice", 130).await?;

    let principal = env.auth.authenticate(REALM, "alice", "password1").await?;
    assert_eq!(principal.realm, REALM);
    assert_eq!(principal.id, "alice");
    assert_eq!(principal.roles.roles().collect::<Vec<_>>(), vec![0, 1, 2, 130]);

    let pair = env.tokens.issue_for_principal(&principal, &["api".to_string()])?;
    let claims = env.tokens.validate(&pair.access_token)?;
    assert_eq!(claims.subject, "alice");
    assert_eq!(claims.claim(REALM_CLAIM).and_then(|v| v.as_str()), Some(REALM));

    Ok(())
}

/// Every authentication failure looks the same at the boundary.
#[tokio::test]
async fn test_failures_collapse_to_one_message() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    env.active_user("alice", "password1", &[]).await?;
    env.directory
        .create_user(cr_auth::NewUser::new(REALM, "bob", "password1"))
        .await?;
    env.active_user("carol", "password1", &[]).await?;
    env.directory.set_user_enabled(REALM, "carol", false).await?;

    let attempts = [
        ("nobody", "password1"),
        ("alice", "wrong-password"),
        ("bob", "password1"),
        ("carol", "password1"),
    ];

    for (id, password) in attempts {
        let err = env.auth.authenticate(REALM, id, password).await.unwrap_err();
        assert!(err.is_authentication_failure(), "{id}: {err}");

        let outward: cr_core::Error = err.into();
        assert!(matches!(outward, cr_core::Error::Authentication));
        assert_eq!(outward.to_string(), "authentication failed");
    }

    Ok(())
}

/// The password is checked before account status.
#[tokio::test]
async fn test_credential_is_checked_before_status() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.directory
        .create_user(cr_auth::NewUser::new(REALM, "bob", "password1"))
        .await?;

    let wrong = env.auth.authenticate(REALM, "bob", "password2").await;
    assert!(matches!(
        wrong,
        Err(AuthError::Credential(CredentialError::InvalidCredential))
    ));

    let right = env.auth.authenticate(REALM, "bob", "password1").await;
    assert!(matches!(
        right,
        Err(AuthError::Account(AccountError::NotActivated))
    ));

    env.directory.activate_user(REALM, "bob").await?;
    env.directory.set_user_enabled(REALM, "bob", false).await?;
    let disabled = env.auth.authenticate(REALM, "bob", "password1").await;
    assert!(matches!(
        disabled,
        Err(AuthError::Account(AccountError::Disabled))
    ));

    Ok(())
}

/// Users stored with each registered method can log in.
#[tokio::test]
async fn test_every_method_authenticates() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    for method in ["PLAIN", "MD5", "SHA1", "SHA256", "SHA512", "ARGON"] {
        let id = format!("user-{}", method.to_lowercase());
        let user = env
            .user_with_method(&id, "password1", &[], VerificationMethod::new(method))
            .await?;
        assert_eq!(user.credential.method.as_str(), method);

        assert!(env.auth.authenticate(REALM, &id, "password1").await.is_ok());
        assert!(env.auth.authenticate(REALM, &id, "password2").await.is_err());
    }

    Ok(())
}

/// Changing a password replaces method and hash together.
#[tokio::test]
async fn test_change_credential() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.user_with_method("alice", "password1", &[], VerificationMethod::new("MD5"))
        .await?;

    let err = env
        .auth
        .change_credential(REALM, "alice", "short")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PolicyViolation(_)));

    env.auth
        .change_credential(REALM, "alice", "new-password")
        .await?;

    let stored = env.directory.get_user(REALM, "alice").await?;
    assert_eq!(stored.credential.method, VerificationMethod::argon2id());

    assert!(env.auth.authenticate(REALM, "alice", "password1").await.is_err());
    env.auth.authenticate(REALM, "alice", "new-password").await?;

    Ok(())
}

/// Concurrent logins share one authenticator.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.group("staff", &[], &[7]).await?;
    for i in 0..8 {
        env.active_user(&format!("user{i}"), "password1", &["staff"])
            .await?;
    }

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let auth = env.auth.clone();
            tokio::spawn(async move { auth.authenticate(REALM, &format!("user{i}"), "password1").await })
        })
        .collect();

    for handle in handles {
        let principal = handle.await??;
        assert!(principal.roles.has_role(7)?);
    }

    Ok(())
}

/// Administrators editing one user concurrently keep every change, and a
/// password change racing them is kept too.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admin_changes() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.group("staff", &[], &[1]).await?;
    env.active_user("alice", "password1", &[]).await?;

    let mut handles = Vec::new();
    for role in 10..40 {
        let directory = env.directory.clone();
        handles.push(tokio::spawn(async move {
            directory.grant_user_role(REALM, "alice", role).await.map(|_| ())
        }));
    }
    let directory = env.directory.clone();
    handles.push(tokio::spawn(async move {
        directory.add_user_to_group(REALM, "alice", "staff").await.map(|_| ())
    }));
    let auth = env.auth.clone();
    handles.push(tokio::spawn(async move {
        auth.change_credential(REALM, "alice", "new-password").await
    }));
    for handle in handles {
        handle.await??;
    }

    let stored = env.users.get(REALM, "alice").await?.expect("alice exists");
    assert!(stored.is_member_of("staff"));
    assert_eq!(stored.role_mask.roles().count(), 30);

    let principal = env.auth.authenticate(REALM, "alice", "new-password").await?;
    assert_eq!(principal.roles.roles().count(), 31);

    Ok(())
}
