//! Password hashing and verification using Argon2id.
//!
//! Hashes are self-describing PHC strings (`$argon2id$v=19$m=...`), so the
//! salt and cost parameters travel with the stored hash.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::credential::CredentialScheme;
use crate::error::{AuthError, AuthResult};

/// Argon2id cost configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Settings {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: u32,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

impl Argon2Settings {
    /// Creates settings with the default cost.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }

    #[allow(clippy::missing_const_for_fn)] // Params::new is not const
    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

/// The `ARGON` credential scheme.
#[derive(Debug, Clone, Default)]
pub struct Argon2Scheme {
    settings: Argon2Settings,
}

impl Argon2Scheme {
    /// Creates a scheme with the given cost settings.
    #[must_use]
    pub const fn new(settings: Argon2Settings) -> Self {
        Self { settings }
    }

    /// Hashes a password, returning the PHC string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the settings are out of range.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let params = self
            .settings
            .build_params()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(hash.to_string())
    }
}

impl CredentialScheme for Argon2Scheme {
    fn create(&self, password: &str) -> AuthResult<String> {
        self.hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::debug!("Stored Argon2 hash is not a valid PHC string");
            return false;
        };

        // Parameters come from the PHC string, not from our settings.
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// A hash is stale when its variant or any cost parameter differs from
    /// the configured settings.
    fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        let params = &parsed.params;

        parsed.algorithm != argon2::ARGON2ID_IDENT
            || params.get_decimal("m") != Some(self.settings.memory_cost)
            || params.get_decimal("t") != Some(self.settings.time_cost)
            || params.get_decimal("p") != Some(self.settings.parallelism)
    }
}
