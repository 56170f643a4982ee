//! Token claim types.
//!
//! [`ClaimSet`] is the validated, typed view of a token payload. On the wire
//! the payload is a flat JSON object: the registered claims (`iss`, `sub`,
//! `aud`, `iat`, `nbf`, `exp`), the `typ` discriminator and any number of
//! additional scalar claims.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};

/// Claim names owned by the token format. They never appear among the
/// additional claims.
pub const RESERVED_CLAIMS: [&str; 7] = ["iss", "aud", "sub", "iat", "exp", "nbf", "typ"];

/// Returns whether `name` is a reserved claim name, ignoring ASCII case.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIMS.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Kind of token, carried in the `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Short-lived access token.
    #[serde(rename = "at+JWT")]
    Access,
    /// Long-lived refresh token.
    #[serde(rename = "rt+JWT")]
    Refresh,
}

impl TokenType {
    /// Returns the `typ` claim value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "at+JWT",
            Self::Refresh => "rt+JWT",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT audience claim (can be single string or array).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience.
    Single(String),
    /// Multiple audiences.
    Multiple(Vec<String>),
}

impl Audience {
    /// Checks if the audience contains a specific value.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(s) => s == value,
            Self::Multiple(v) => v.iter().any(|s| s == value),
        }
    }

    /// Returns the audiences as a vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s],
            Self::Multiple(v) => v,
        }
    }
}

impl From<Vec<String>> for Audience {
    fn from(mut v: Vec<String>) -> Self {
        match (v.pop(), v.is_empty()) {
            (Some(only), true) => Self::Single(only),
            (Some(last), false) => {
                v.push(last);
                Self::Multiple(v)
            }
            (None, _) => Self::Multiple(Vec::new()),
        }
    }
}

/// A scalar claim value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    String(String),
}

impl ClaimValue {
    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for ClaimValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ClaimValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for ClaimValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Additional (non-reserved) claims, ordered by name.
pub type AdditionalClaims = BTreeMap<String, ClaimValue>;

/// The validated contents of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    /// Issuer.
    pub issuer: String,
    /// Subject.
    pub subject: String,
    /// Intended recipients.
    pub audience: Vec<String>,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Start of validity.
    pub not_before: DateTime<Utc>,
    /// End of validity.
    pub expires_at: DateTime<Utc>,
    /// Access or refresh.
    pub token_type: TokenType,
    /// Every non-reserved claim.
    pub additional: AdditionalClaims,
}

impl ClaimSet {
    /// Returns whether the claims are within their validity window at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        self.not_before.timestamp() <= now && now <= self.expires_at.timestamp()
    }

    /// Returns an additional claim.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&ClaimValue> {
        self.additional.get(name)
    }
}

/// Payload as serialized into the token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    pub iss: String,
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub typ: TokenType,
    #[serde(flatten)]
    pub extra: AdditionalClaims,
}

impl From<&ClaimSet> for WireClaims {
    fn from(claims: &ClaimSet) -> Self {
        let aud = if claims.audience.is_empty() {
            None
        } else {
            Some(Audience::from(claims.audience.clone()))
        };
        Self {
            iss: claims.issuer.clone(),
            sub: claims.subject.clone(),
            aud,
            iat: claims.issued_at.timestamp(),
            nbf: claims.not_before.timestamp(),
            exp: claims.expires_at.timestamp(),
            typ: claims.token_type,
            extra: claims
                .additional
                .iter()
                .filter(|(name, _)| !is_reserved(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

impl TryFrom<WireClaims> for ClaimSet {
    type Error = TokenError;

    fn try_from(wire: WireClaims) -> TokenResult<Self> {
        let mut additional = wire.extra;
        additional.retain(|name, _| !is_reserved(name));

        Ok(Self {
            issuer: wire.iss,
            subject: wire.sub,
            audience: wire.aud.map(Audience::into_vec).unwrap_or_default(),
            issued_at: timestamp("iat", wire.iat)?,
            not_before: timestamp("nbf", wire.nbf)?,
            expires_at: timestamp("exp", wire.exp)?,
            token_type: wire.typ,
            additional,
        })
    }
}

fn timestamp(claim: &str, secs: i64) -> TokenResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TokenError::Malformed(format!("{claim} out of range: {secs}")))
}
