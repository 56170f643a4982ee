//! Credential verification.
//!
//! A stored credential is a `(method, hash)` pair. The [`CredentialVerifier`]
//! is a strategy table keyed by method tag: every tag maps to a
//! [`CredentialScheme`] that knows how to create a hash and how to check a
//! password against one. New methods are added by registering a scheme.

use std::collections::HashMap;
use std::sync::Arc;

use cr_crypto::{DigestAlgorithm, constant_time_eq, hex_digest, verify_hex_digest};
use cr_model::{Credential, VerificationMethod};

use crate::error::{AuthResult, CredentialError};
use crate::password::{Argon2Scheme, Argon2Settings};

/// A password hashing scheme.
pub trait CredentialScheme: Send + Sync {
    /// Produces the stored representation of `password`.
    ///
    /// The password is never empty here; the verifier rejects that first.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying primitive fails.
    fn create(&self, password: &str) -> AuthResult<String>;

    /// Checks `password` against a stored hash.
    ///
    /// Malformed stored hashes simply fail to match.
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// Returns whether a hash that just verified should be recomputed with
    /// the current settings. Schemes without tunable cost never ask.
    fn needs_rehash(&self, _hash: &str) -> bool {
        false
    }
}

/// Stores the password unchanged. Reversible; only for migration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainScheme;

impl CredentialScheme for PlainScheme {
    fn create(&self, password: &str) -> AuthResult<String> {
        Ok(password.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        constant_time_eq(password.as_bytes(), hash.as_bytes())
    }
}

/// Unsalted lowercase-hex digest of the password.
#[derive(Debug, Clone, Copy)]
pub struct DigestScheme {
    algorithm: DigestAlgorithm,
}

impl DigestScheme {
    /// Creates a scheme for one digest algorithm.
    #[must_use]
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }
}

impl CredentialScheme for DigestScheme {
    fn create(&self, password: &str) -> AuthResult<String> {
        Ok(hex_digest(self.algorithm, password.as_bytes()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        verify_hex_digest(self.algorithm, password.as_bytes(), hash)
    }
}

/// Strategy table of credential schemes keyed by verification method.
#[derive(Clone)]
pub struct CredentialVerifier {
    schemes: HashMap<VerificationMethod, Arc<dyn CredentialScheme>>,
}

impl CredentialVerifier {
    /// Creates a verifier with no schemes registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schemes: HashMap::new(),
        }
    }

    /// Creates a verifier with the six built-in schemes.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_argon2(Argon2Settings::default())
    }

    /// Creates a verifier with the built-in schemes and custom Argon2 cost.
    #[must_use]
    pub fn with_argon2(settings: Argon2Settings) -> Self {
        let mut verifier = Self::empty();
        verifier.register(VerificationMethod::PLAIN, PlainScheme);
        for algorithm in DigestAlgorithm::ALL {
            verifier.register(algorithm.name(), DigestScheme::new(algorithm));
        }
        verifier.register(VerificationMethod::ARGON2ID, Argon2Scheme::new(settings));
        verifier
    }

    /// Registers (or replaces) the scheme for a method tag.
    pub fn register<S>(&mut self, method: impl Into<VerificationMethod>, scheme: S)
    where
        S: CredentialScheme + 'static,
    {
        self.schemes.insert(method.into(), Arc::new(scheme));
    }

    /// Checks whether a method tag has a scheme.
    #[must_use]
    pub fn supports(&self, method: &VerificationMethod) -> bool {
        self.schemes.contains_key(method)
    }

    /// Lists registered method tags, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<VerificationMethod> {
        let mut methods: Vec<_> = self.schemes.keys().cloned().collect();
        methods.sort();
        methods
    }

    /// Hashes `password` with `method`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPassword` for an empty password and `UnknownMethod` for
    /// an unregistered tag.
    pub fn create(&self, method: &VerificationMethod, password: &str) -> AuthResult<String> {
        if password.is_empty() {
            return Err(CredentialError::EmptyPassword.into());
        }
        let scheme = self
            .schemes
            .get(method)
            .ok_or_else(|| CredentialError::UnknownMethod(method.to_string()))?;
        scheme.create(password)
    }

    /// Builds a complete credential for `password`.
    ///
    /// # Errors
    ///
    /// Same as [`CredentialVerifier::create`].
    pub fn credential(&self, method: &VerificationMethod, password: &str) -> AuthResult<Credential> {
        let hash = self.create(method, password)?;
        Ok(Credential::new(method.clone(), hash))
    }

    /// Checks `password` against a stored hash.
    ///
    /// An empty password, an unknown method, or a malformed hash all return
    /// `false`.
    #[must_use]
    pub fn verify(&self, method: &VerificationMethod, password: &str, hash: &str) -> bool {
        if password.is_empty() {
            return false;
        }
        match self.schemes.get(method) {
            Some(scheme) => scheme.verify(password, hash),
            None => {
                tracing::warn!("No credential scheme registered for method {}", method);
                false
            }
        }
    }

    /// Checks `password` against a stored credential.
    #[must_use]
    pub fn verify_credential(&self, credential: &Credential, password: &str) -> bool {
        self.verify(&credential.method, password, &credential.hash)
    }

    /// Returns whether a stored credential was produced with outdated
    /// settings of its own method.
    #[must_use]
    pub fn needs_rehash(&self, credential: &Credential) -> bool {
        self.schemes
            .get(&credential.method)
            .is_some_and(|scheme| scheme.needs_rehash(&credential.hash))
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    fn fast_verifier() -> CredentialVerifier {
        CredentialVerifier::with_argon2(Argon2Settings::new().memory_cost(1024).time_cost(1))
    }

    #[test]
    fn every_builtin_method_round_trips() {
        let verifier = fast_verifier();
        assert_eq!(verifier.methods().len(), 6);

        for method in verifier.methods() {
            let hash = verifier.create(&method, "s3cret-pass").unwrap();
            assert!(verifier.verify(&method, "s3cret-pass", &hash), "{method}");
            assert!(!verifier.verify(&method, "s3cret-pasS", &hash), "{method}");
            assert!(!verifier.verify(&method, "", &hash), "{method}");
        }
    }

    #[test]
    fn digest_hashes_are_lowercase_hex() {
        let verifier = fast_verifier();
        let hash = verifier
            .create(&VerificationMethod::new("SHA256"), "abc")
            .unwrap();
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let plain = verifier.create(&VerificationMethod::plain(), "abc").unwrap();
        assert_eq!(plain, "abc");
    }

    #[test]
    fn empty_password_is_rejected_for_every_method() {
        let verifier = fast_verifier();
        for method in verifier.methods() {
            assert!(matches!(
                verifier.create(&method, ""),
                Err(AuthError::Credential(CredentialError::EmptyPassword))
            ));
        }
        // A PLAIN record with an empty stored value must not accept "".
        assert!(!verifier.verify(&VerificationMethod::plain(), "", ""));
    }

    #[test]
    fn unknown_method() {
        let verifier = fast_verifier();
        let bcrypt = VerificationMethod::new("BCRYPT");

        assert!(matches!(
            verifier.create(&bcrypt, "x"),
            Err(AuthError::Credential(CredentialError::UnknownMethod(m))) if m == "BCRYPT"
        ));
        assert!(!verifier.verify(&bcrypt, "x", "x"));
        assert!(!verifier.supports(&bcrypt));
    }

    #[test]
    fn malformed_hashes_do_not_match() {
        let verifier = fast_verifier();
        assert!(!verifier.verify(&VerificationMethod::argon2id(), "pw", "not-a-phc-string"));
        assert!(!verifier.verify(&VerificationMethod::new("MD5"), "pw", "zz"));
    }

    #[test]
    fn only_stale_argon2_credentials_need_rehash() {
        let verifier = fast_verifier();
        let stronger =
            CredentialVerifier::with_argon2(Argon2Settings::new().memory_cost(2048).time_cost(1));
        let argon = verifier
            .credential(&VerificationMethod::argon2id(), "pw")
            .unwrap();
        let sha = verifier
            .credential(&VerificationMethod::new("SHA512"), "pw")
            .unwrap();

        assert!(!verifier.needs_rehash(&argon));
        assert!(stronger.needs_rehash(&argon));
        assert!(!stronger.needs_rehash(&sha));
        assert!(!verifier.needs_rehash(&Credential::new(VerificationMethod::new("BCRYPT"), "x")));
    }

    #[test]
    fn custom_scheme_can_be_registered() {
        struct Reversed;
        impl CredentialScheme for Reversed {
            fn create(&self, password: &str) -> AuthResult<String> {
                Ok(password.chars().rev().collect())
            }
            fn verify(&self, password: &str, hash: &str) -> bool {
                password.chars().rev().collect::<String>() == hash
            }
        }

        let mut verifier = CredentialVerifier::empty();
        verifier.register("REVERSED", Reversed);
        let method = VerificationMethod::new("reversed");

        let credential = verifier.credential(&method, "abc").unwrap();
        assert_eq!(credential.hash, "cba");
        assert!(verifier.verify_credential(&credential, "abc"));
    }
}
