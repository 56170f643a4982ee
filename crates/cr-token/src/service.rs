//! Token issuance, validation and refresh.
//!
//! The free functions are stateless: every input (issuer, TTLs, keys, the
//! clock) is passed in. [`TokenService`] binds them to a configured issuer,
//! lifetimes and key pair.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use cr_core::TokenSettings;
use cr_model::Principal;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Header, Validation, decode, encode};

use crate::claims::{AdditionalClaims, ClaimSet, ClaimValue, TokenType, WireClaims, is_reserved};
use crate::error::{TokenError, TokenResult};
use crate::keys::{SigningKey, TokenAlgorithm, VerifyingKey};

/// Claim used by [`TokenService::issue_for_principal`] to carry the realm.
pub const REALM_CLAIM: &str = "realm";

/// Contents shared by the tokens of one issuance.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRequest {
    /// Issuer.
    pub issuer: String,
    /// Subject.
    pub subject: String,
    /// Intended recipients.
    pub audience: Vec<String>,
    /// Additional claims. Reserved names are dropped when signing.
    pub additional: AdditionalClaims,
}

impl TokenRequest {
    /// Creates a request with no audience and no additional claims.
    #[must_use]
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            audience: Vec::new(),
            additional: AdditionalClaims::new(),
        }
    }

    /// Adds an audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }

    /// Sets an additional claim.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.additional.insert(name.into(), value.into());
        self
    }
}

impl From<&ClaimSet> for TokenRequest {
    fn from(claims: &ClaimSet) -> Self {
        Self {
            issuer: claims.issuer.clone(),
            subject: claims.subject.clone(),
            audience: claims.audience.clone(),
            additional: claims.additional.clone(),
        }
    }
}

/// An access token and its refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Expiry of the access token.
    pub access_expires_at: DateTime<Utc>,
    /// Expiry of the refresh token.
    pub refresh_expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// Signs one token of the given type.
///
/// `issued_at` is truncated to whole seconds; `not_before` equals it and
/// `expires_at` is `issued_at + ttl`.
///
/// # Errors
///
/// Returns `TokenError::LifetimeOutOfRange` if the expiry overflows, or
/// `TokenError::Signing` if the key cannot sign.
pub fn issue(
    request: &TokenRequest,
    token_type: TokenType,
    issued_at: DateTime<Utc>,
    ttl: Duration,
    key: &SigningKey,
) -> TokenResult<String> {
    for name in request.additional.keys().filter(|name| is_reserved(name)) {
        tracing::warn!("Dropping reserved claim {} from token for {}", name, request.subject);
    }

    let issued_at = issued_at.trunc_subsecs(0);
    let claims = ClaimSet {
        issuer: request.issuer.clone(),
        subject: request.subject.clone(),
        audience: request.audience.clone(),
        issued_at,
        not_before: issued_at,
        expires_at: expiry(issued_at, ttl)?,
        token_type,
        additional: request.additional.clone(),
    };

    let header = Header::new(key.algorithm().jwt_algorithm());
    encode(&header, &WireClaims::from(&claims), key.encoding_key())
        .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Signs an access token and a refresh token with identical contents.
///
/// The returned expiries are the whole-second `exp` values of the tokens.
///
/// # Errors
///
/// Same as [`issue`].
pub fn issue_pair(
    request: &TokenRequest,
    issued_at: DateTime<Utc>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    key: &SigningKey,
) -> TokenResult<TokenPair> {
    let issued_at = issued_at.trunc_subsecs(0);
    Ok(TokenPair {
        access_token: issue(request, TokenType::Access, issued_at, access_ttl, key)?,
        refresh_token: issue(request, TokenType::Refresh, issued_at, refresh_ttl, key)?,
        access_expires_at: expiry(issued_at, access_ttl)?,
        refresh_expires_at: expiry(issued_at, refresh_ttl)?,
    })
}

fn expiry(issued_at: DateTime<Utc>, ttl: Duration) -> TokenResult<DateTime<Utc>> {
    issued_at.checked_add_signed(ttl).ok_or_else(|| {
        TokenError::LifetimeOutOfRange(format!("{ttl} after {issued_at}"))
    })
}

fn lifespan(name: &str, secs: i64) -> TokenResult<Duration> {
    Duration::try_seconds(secs)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| TokenError::LifetimeOutOfRange(format!("{name} lifespan of {secs}s")))
}

/// Validates a token against the current time.
///
/// # Errors
///
/// See [`validate_at`].
pub fn validate(token: &str, key: &VerifyingKey) -> TokenResult<ClaimSet> {
    validate_at(token, key, Utc::now())
}

/// Validates a token as of `now`.
///
/// The signature is checked first; the token is then accepted while
/// `nbf <= now <= exp`, compared in whole seconds.
///
/// # Errors
///
/// - `Malformed` if the token cannot be parsed
/// - `BadSignature` if the signature does not verify under `key`
/// - `NotYetValid` / `Expired` outside the validity window
pub fn validate_at(token: &str, key: &VerifyingKey, now: DateTime<Utc>) -> TokenResult<ClaimSet> {
    let mut validation = Validation::new(key.algorithm().jwt_algorithm());
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<WireClaims>(token, key.decoding_key(), &validation).map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        decode_error(&e)
    })?;
    let claims = ClaimSet::try_from(data.claims)?;

    let now_secs = now.timestamp();
    if now_secs < claims.not_before.timestamp() {
        tracing::debug!("Token for {} used before nbf", claims.subject);
        return Err(TokenError::NotYetValid);
    }
    if now_secs > claims.expires_at.timestamp() {
        tracing::debug!("Token for {} expired at {}", claims.subject, claims.expires_at);
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Exchanges a refresh token for a new access token at the current time.
///
/// # Errors
///
/// See [`refresh_at`].
pub fn refresh(
    refresh_token: &str,
    verifying_key: &VerifyingKey,
    signing_key: &SigningKey,
    access_ttl: Duration,
) -> TokenResult<String> {
    refresh_at(refresh_token, verifying_key, signing_key, access_ttl, Utc::now())
}

/// Exchanges a refresh token for a new access token as of `now`.
///
/// The new token carries the refresh token's issuer, subject, audience and
/// additional claims. The refresh token itself is left untouched.
///
/// # Errors
///
/// Any [`validate_at`] error, `WrongTokenType` if the input is not a refresh
/// token, or `Signing`.
pub fn refresh_at(
    refresh_token: &str,
    verifying_key: &VerifyingKey,
    signing_key: &SigningKey,
    access_ttl: Duration,
    now: DateTime<Utc>,
) -> TokenResult<String> {
    let claims = validate_at(refresh_token, verifying_key, now)?;
    if claims.token_type != TokenType::Refresh {
        return Err(TokenError::WrongTokenType {
            expected: TokenType::Refresh,
            actual: claims.token_type,
        });
    }

    issue(
        &TokenRequest::from(&claims),
        TokenType::Access,
        now,
        access_ttl,
        signing_key,
    )
}

fn decode_error(err: &jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed(err.to_string()),
    }
}

/// Default access token lifetime (5 minutes).
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 300;

/// Default refresh token lifetime (30 days).
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 2_592_000;

/// Token operations bound to an issuer, lifetimes and a key pair.
#[derive(Debug, Clone)]
pub struct TokenService {
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl TokenService {
    /// Creates a service with the default lifetimes.
    #[must_use]
    pub fn new(issuer: impl Into<String>, signing_key: SigningKey, verifying_key: VerifyingKey) -> Self {
        Self {
            issuer: issuer.into(),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
            signing_key,
            verifying_key,
        }
    }

    /// Builds a service from token settings, reading both keys from their
    /// configured PEM files.
    ///
    /// # Errors
    ///
    /// - `UnsupportedAlgorithm` for an unknown algorithm name
    /// - `LifetimeOutOfRange` for a lifespan that is not a positive,
    ///   representable number of seconds
    /// - `InvalidKey` if a key path is missing or the file is unusable
    pub fn from_settings(settings: &TokenSettings) -> TokenResult<Self> {
        let algorithm: TokenAlgorithm = settings.algorithm.parse()?;
        let access_ttl = lifespan("access", settings.access_token_lifespan)?;
        let refresh_ttl = lifespan("refresh", settings.refresh_token_lifespan)?;

        let signing_path = settings
            .signing_key_path
            .as_deref()
            .ok_or_else(|| TokenError::InvalidKey("no signing key path configured".to_string()))?;
        let verifying_path = settings
            .verifying_key_path
            .as_deref()
            .ok_or_else(|| TokenError::InvalidKey("no verifying key path configured".to_string()))?;

        let service = Self::new(
            settings.issuer.clone(),
            SigningKey::from_pem_file(algorithm, signing_path)?,
            VerifyingKey::from_pem_file(algorithm, verifying_path)?,
        )
        .with_access_ttl(access_ttl)
        .with_refresh_ttl(refresh_ttl);

        tracing::info!(
            "Token service ready: issuer {}, algorithm {}",
            service.issuer,
            algorithm
        );
        Ok(service)
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub const fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub const fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Returns the issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the access token lifetime.
    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Returns the refresh token lifetime.
    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issues a token pair at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if signing fails.
    pub fn issue_pair_at(
        &self,
        subject: &str,
        audience: &[String],
        additional: AdditionalClaims,
        issued_at: DateTime<Utc>,
    ) -> TokenResult<TokenPair> {
        let request = TokenRequest {
            issuer: self.issuer.clone(),
            subject: subject.to_string(),
            audience: audience.to_vec(),
            additional,
        };
        issue_pair(
            &request,
            issued_at,
            self.access_ttl,
            self.refresh_ttl,
            &self.signing_key,
        )
    }

    /// Issues a token pair now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if signing fails.
    pub fn issue_pair(
        &self,
        subject: &str,
        audience: &[String],
        additional: AdditionalClaims,
    ) -> TokenResult<TokenPair> {
        self.issue_pair_at(subject, audience, additional, Utc::now())
    }

    /// Issues a token pair for an authenticated principal, carrying its
    /// realm in the `realm` claim.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if signing fails.
    pub fn issue_for_principal(
        &self,
        principal: &Principal,
        audience: &[String],
    ) -> TokenResult<TokenPair> {
        let mut additional = AdditionalClaims::new();
        additional.insert(REALM_CLAIM.to_string(), principal.realm.as_str().into());
        self.issue_pair(&principal.id, audience, additional)
    }

    /// Validates a token now.
    ///
    /// # Errors
    ///
    /// See [`validate_at`].
    pub fn validate(&self, token: &str) -> TokenResult<ClaimSet> {
        validate(token, &self.verifying_key)
    }

    /// Validates a token as of `now`.
    ///
    /// # Errors
    ///
    /// See [`validate_at`].
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<ClaimSet> {
        validate_at(token, &self.verifying_key, now)
    }

    /// Exchanges a refresh token for a new access token now.
    ///
    /// # Errors
    ///
    /// See [`refresh_at`].
    pub fn refresh(&self, refresh_token: &str) -> TokenResult<String> {
        self.refresh_at(refresh_token, Utc::now())
    }

    /// Exchanges a refresh token for a new access token as of `now`.
    ///
    /// # Errors
    ///
    /// See [`refresh_at`].
    pub fn refresh_at(&self, refresh_token: &str, now: DateTime<Utc>) -> TokenResult<String> {
        refresh_at(
            refresh_token,
            &self.verifying_key,
            &self.signing_key,
            self.access_ttl,
            now,
        )
    }
}
