//! Stored credential model.
//!
//! A credential is always the pair of a verification method tag and the hash
//! that method produced. The hash format is method-specific: the raw password
//! for `PLAIN`, lowercase hex for the digest methods, and a PHC string for
//! Argon2id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag naming the scheme that produced a stored hash.
///
/// Kept as an open string type so new schemes can be registered without
/// touching this crate. Tags are normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VerificationMethod(String);

impl VerificationMethod {
    /// Password stored as-is.
    pub const PLAIN: &'static str = "PLAIN";
    /// Hex MD5 digest.
    pub const MD5: &'static str = "MD5";
    /// Hex SHA-1 digest.
    pub const SHA1: &'static str = "SHA1";
    /// Hex SHA-256 digest.
    pub const SHA256: &'static str = "SHA256";
    /// Hex SHA-512 digest.
    pub const SHA512: &'static str = "SHA512";
    /// Argon2id PHC string. The tag is `ARGON` in existing records.
    pub const ARGON2ID: &'static str = "ARGON";

    /// Creates a tag, normalizing to upper case.
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_uppercase())
    }

    /// Plain-text method.
    #[must_use]
    pub fn plain() -> Self {
        Self::new(Self::PLAIN)
    }

    /// Argon2id method.
    #[must_use]
    pub fn argon2id() -> Self {
        Self::new(Self::ARGON2ID)
    }

    /// Returns the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VerificationMethod {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for VerificationMethod {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<VerificationMethod> for String {
    fn from(method: VerificationMethod) -> Self {
        method.0
    }
}

/// A user's stored credential.
///
/// ## Security Note
///
/// `hash` may be the plain password for legacy `PLAIN` records, so the
/// `Debug` output never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Scheme that produced `hash`.
    pub method: VerificationMethod,
    /// Method-specific encoded hash.
    pub hash: String,
}

impl Credential {
    /// Creates a credential from an already computed hash.
    #[must_use]
    pub fn new(method: VerificationMethod, hash: impl Into<String>) -> Self {
        Self {
            method,
            hash: hash.into(),
        }
    }

    /// Returns true if no hash has been set yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::new(VerificationMethod::argon2id(), "")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("method", &self.method)
            .field("hash", &"[REDACTED]")
            .finish()
    }
}
