//! Configuration management for credenta.
//!
//! Configuration is loaded from environment variables (optionally seeded from
//! a `.env` file) with defaults matching the reference deployment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of 64-bit words in a role mask when nothing else is configured.
pub const DEFAULT_ROLE_MASK_WORDS: usize = 10;

/// Realm used by the `*_default` convenience operations.
pub const DEFAULT_REALM: &str = "DEFAULT";

/// Longest accepted token lifespan, in seconds (100 years).
pub const MAX_TOKEN_LIFESPAN_SECS: i64 = 100 * 365 * 86_400;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Realm used when callers do not name one.
    pub default_realm: String,
    /// Number of 64-bit words in every role mask of this deployment.
    pub role_mask_words: usize,
    /// Passphrase composition policy applied to new and changed passwords.
    pub passphrase_policy: PassphrasePolicyKind,
    /// Verification method tag used for new credentials.
    pub verification_method: String,
    /// Token issuance settings.
    pub token: TokenSettings,
}

/// Token issuance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Issuer (`iss`) written into every token.
    pub issuer: String,
    /// Access token lifespan in seconds.
    pub access_token_lifespan: i64,
    /// Refresh token lifespan in seconds.
    pub refresh_token_lifespan: i64,
    /// JWA name of the signing algorithm (RS256, RS384 or RS512).
    pub algorithm: String,
    /// Path to the PEM-encoded RSA private key.
    pub signing_key_path: Option<String>,
    /// Path to the PEM-encoded RSA public key.
    pub verifying_key_path: Option<String>,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: "credenta".to_string(),
            access_token_lifespan: 300,        // 5 minutes
            refresh_token_lifespan: 2_592_000, // 30 days
            algorithm: "RS256".to_string(),
            signing_key_path: None,
            verifying_key_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_realm: DEFAULT_REALM.to_string(),
            role_mask_words: DEFAULT_ROLE_MASK_WORDS,
            passphrase_policy: PassphrasePolicyKind::Simple,
            verification_method: "ARGON".to_string(),
            token: TokenSettings::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is present but invalid.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Missing keys fall back to [`Config::default`]; present but invalid
    /// values are rejected instead of silently defaulted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_realm = lookup("CREDENTA_REALM_DEFAULT").unwrap_or(defaults.default_realm);
        if default_realm.trim().is_empty() {
            return Err(Error::Config(
                "CREDENTA_REALM_DEFAULT must not be empty".to_string(),
            ));
        }

        let role_mask_words = parse_or(
            &lookup,
            "CREDENTA_ROLE_MASK_WORDS",
            defaults.role_mask_words,
        )?;
        if role_mask_words == 0 {
            return Err(Error::Config(
                "CREDENTA_ROLE_MASK_WORDS must be at least 1".to_string(),
            ));
        }

        let passphrase_policy =
            parse_or(&lookup, "CREDENTA_PASS_POLICY", defaults.passphrase_policy)?;

        let verification_method = lookup("CREDENTA_VERIFICATION_METHOD")
            .map(|m| m.trim().to_ascii_uppercase())
            .unwrap_or(defaults.verification_method);

        let token = TokenSettings {
            issuer: lookup("CREDENTA_TOKEN_ISSUER").unwrap_or(defaults.token.issuer),
            access_token_lifespan: parse_or(
                &lookup,
                "CREDENTA_ACCESS_TOKEN_LIFESPAN",
                defaults.token.access_token_lifespan,
            )?,
            refresh_token_lifespan: parse_or(
                &lookup,
                "CREDENTA_REFRESH_TOKEN_LIFESPAN",
                defaults.token.refresh_token_lifespan,
            )?,
            algorithm: lookup("CREDENTA_TOKEN_ALGORITHM")
                .map(|a| a.trim().to_ascii_uppercase())
                .unwrap_or(defaults.token.algorithm),
            signing_key_path: lookup("CREDENTA_SIGNING_KEY_PATH").filter(|p| !p.trim().is_empty()),
            verifying_key_path: lookup("CREDENTA_VERIFYING_KEY_PATH")
                .filter(|p| !p.trim().is_empty()),
        };

        for (key, secs) in [
            ("CREDENTA_ACCESS_TOKEN_LIFESPAN", token.access_token_lifespan),
            ("CREDENTA_REFRESH_TOKEN_LIFESPAN", token.refresh_token_lifespan),
        ] {
            if !(1..=MAX_TOKEN_LIFESPAN_SECS).contains(&secs) {
                return Err(Error::Config(format!(
                    "{key} must be between 1 and {MAX_TOKEN_LIFESPAN_SECS} seconds, got {secs}"
                )));
            }
        }

        Ok(Self {
            default_realm,
            role_mask_words,
            passphrase_policy,
            verification_method,
            token,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

/// Named passphrase composition policies.
///
/// Selected by name from configuration; an unknown name is a configuration
/// error rather than a fallback to the weakest policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PassphrasePolicyKind {
    /// One word of at least eight characters.
    Simple,
    /// At least three words of five letters, twelve characters in total.
    Strong,
    /// One word of eight characters with upper case, digit and symbol.
    Classic,
}

impl PassphrasePolicyKind {
    /// Returns the configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Strong => "STRONG",
            Self::Classic => "CLASSIC",
        }
    }
}

impl fmt::Display for PassphrasePolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassphrasePolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "STRONG" => Ok(Self::Strong),
            "CLASSIC" => Ok(Self::Classic),
            other => Err(Error::Config(format!(
                "unknown passphrase policy '{other}' (expected SIMPLE, STRONG or CLASSIC)"
            ))),
        }
    }
}
