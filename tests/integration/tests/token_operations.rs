//! Token lifecycle integration tests.

use chrono::{Duration, Utc};
use cr_token::{AdditionalClaims, ClaimValue, TokenError, TokenType};

use crate::common::{ISSUER, REALM, TestEnv};

/// A five-minute token is valid at issuance and expired six minutes later.
#[tokio::test]
async fn test_access_token_expires() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let tokens = env.tokens.clone().with_access_ttl(Duration::minutes(5));
    let now = Utc::now();

    let pair = tokens.issue_pair_at("alice", &[], AdditionalClaims::new(), now)?;

    let claims = tokens.validate_at(&pair.access_token, now)?;
    assert_eq!(claims.issuer, ISSUER);
    assert!(matches!(
        tokens.validate_at(&pair.access_token, now + Duration::minutes(6)),
        Err(TokenError::Expired)
    ));
    // The refresh token outlives it.
    tokens.validate_at(&pair.refresh_token, now + Duration::minutes(6))?;

    Ok(())
}

/// Access tokens cannot be used to refresh.
#[tokio::test]
async fn test_refresh_requires_refresh_token() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let pair = env.tokens.issue_pair("alice", &[], AdditionalClaims::new())?;

    let err = env.tokens.refresh(&pair.access_token).unwrap_err();
    assert!(matches!(
        err,
        TokenError::WrongTokenType {
            expected: TokenType::Refresh,
            actual: TokenType::Access
        }
    ));

    let outward: cr_core::Error = err.into();
    assert!(outward.is_client_error());

    Ok(())
}

/// Both tokens of a pair carry the same claims.
#[tokio::test]
async fn test_pair_claims_match() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut additional = AdditionalClaims::new();
    additional.insert("tier".to_string(), ClaimValue::from("gold"));
    additional.insert("mfa".to_string(), ClaimValue::from(true));
    additional.insert("score".to_string(), ClaimValue::from(0.75));

    let audience = vec!["api".to_string(), "console".to_string()];
    let pair = env.tokens.issue_pair("alice", &audience, additional.clone())?;

    let access = env.tokens.validate(&pair.access_token)?;
    let refresh = env.tokens.validate(&pair.refresh_token)?;

    for claims in [&access, &refresh] {
        assert_eq!(claims.issuer, ISSUER);
        assert_eq!(claims.subject, "alice");
        assert_eq!(claims.audience, audience);
        assert_eq!(claims.additional, additional);
    }
    assert_eq!(access.issued_at, refresh.issued_at);
    assert_ne!(access.token_type, refresh.token_type);
    assert!(access.expires_at < refresh.expires_at);

    Ok(())
}

/// Login, tokens, refresh, and validation of the refreshed token.
#[tokio::test]
async fn test_login_then_refresh() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.group("staff", &[], &[3]).await?;
    env.active_user("alice", "password1", &["staff"]).await?;

    let principal = env.auth.authenticate(REALM, "alice", "password1").await?;
    let pair = env.tokens.issue_for_principal(&principal, &["api".to_string()])?;

    let later = Utc::now() + Duration::hours(1);
    let renewed = env.tokens.refresh_at(&pair.refresh_token, later)?;
    let claims = env.tokens.validate_at(&renewed, later)?;

    assert_eq!(claims.token_type, TokenType::Access);
    assert_eq!(claims.subject, principal.id);
    assert_eq!(claims.audience, vec!["api"]);
    assert_eq!(claims.claim("realm"), Some(&ClaimValue::from(REALM)));
    assert_eq!(claims.expires_at - claims.issued_at, env.tokens.access_ttl());

    Ok(())
}
