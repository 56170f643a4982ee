//! Token signing algorithms and keys.
//!
//! Tokens are signed with an RSA private key and verified with the matching
//! public key. Keys are PEM encoded: PKCS#1 or PKCS#8 for private keys, SPKI
//! or PKCS#1 for public keys.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::error::{TokenError, TokenResult};

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TokenAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[default]
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    Rs512,
}

impl TokenAlgorithm {
    /// Returns the JOSE algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
        }
    }

    pub(crate) const fn jwt_algorithm(self) -> Algorithm {
        match self {
            Self::Rs256 => Algorithm::RS256,
            Self::Rs384 => Algorithm::RS384,
            Self::Rs512 => Algorithm::RS512,
        }
    }
}

impl fmt::Display for TokenAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RS256" => Ok(Self::Rs256),
            "RS384" => Ok(Self::Rs384),
            "RS512" => Ok(Self::Rs512),
            _ => Err(TokenError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Private key for signing tokens.
#[derive(Clone)]
pub struct SigningKey {
    algorithm: TokenAlgorithm,
    encoding_key: EncodingKey,
}

impl SigningKey {
    /// Creates a signing key from a PEM-encoded RSA private key.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the PEM is not an RSA private key.
    pub fn from_pem(algorithm: TokenAlgorithm, pem: &[u8]) -> TokenResult<Self> {
        let encoding_key =
            EncodingKey::from_rsa_pem(pem).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self {
            algorithm,
            encoding_key,
        })
    }

    /// Reads a signing key from a PEM file.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the file cannot be read or parsed.
    pub fn from_pem_file(algorithm: TokenAlgorithm, path: impl AsRef<Path>) -> TokenResult<Self> {
        Self::from_pem(algorithm, &read_pem(path.as_ref())?)
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> TokenAlgorithm {
        self.algorithm
    }

    pub(crate) const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("encoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Public key for verifying tokens.
#[derive(Clone)]
pub struct VerifyingKey {
    algorithm: TokenAlgorithm,
    decoding_key: DecodingKey,
}

impl VerifyingKey {
    /// Creates a verifying key from a PEM-encoded RSA public key.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the PEM is not an RSA public key.
    pub fn from_pem(algorithm: TokenAlgorithm, pem: &[u8]) -> TokenResult<Self> {
        let decoding_key =
            DecodingKey::from_rsa_pem(pem).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self {
            algorithm,
            decoding_key,
        })
    }

    /// Reads a verifying key from a PEM file.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the file cannot be read or parsed.
    pub fn from_pem_file(algorithm: TokenAlgorithm, path: impl AsRef<Path>) -> TokenResult<Self> {
        Self::from_pem(algorithm, &read_pem(path.as_ref())?)
    }

    /// Returns the expected algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> TokenAlgorithm {
        self.algorithm
    }

    pub(crate) const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn read_pem(path: &Path) -> TokenResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| TokenError::InvalidKey(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNING_PEM: &[u8] = include_bytes!("../fixtures/signing_key.pem");
    const VERIFYING_PEM: &[u8] = include_bytes!("../fixtures/verifying_key.pem");

    #[test]
    fn algorithm_names() {
        assert_eq!("rs384".parse::<TokenAlgorithm>().unwrap(), TokenAlgorithm::Rs384);
        assert_eq!(TokenAlgorithm::default().to_string(), "RS256");
        assert!(matches!(
            "HS256".parse::<TokenAlgorithm>(),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn loads_fixture_keys() {
        let signing = SigningKey::from_pem(TokenAlgorithm::Rs256, SIGNING_PEM).unwrap();
        let verifying = VerifyingKey::from_pem(TokenAlgorithm::Rs256, VERIFYING_PEM).unwrap();
        assert_eq!(signing.algorithm(), verifying.algorithm());
    }

    #[test]
    fn loads_keys_from_files() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");
        SigningKey::from_pem_file(TokenAlgorithm::Rs512, format!("{dir}/signing_key.pem")).unwrap();
        VerifyingKey::from_pem_file(TokenAlgorithm::Rs512, format!("{dir}/verifying_key.pem"))
            .unwrap();
    }

    #[test]
    fn rejects_bad_key_material() {
        assert!(matches!(
            SigningKey::from_pem(TokenAlgorithm::Rs256, b"not a key"),
            Err(TokenError::InvalidKey(_))
        ));
        let err = VerifyingKey::from_pem_file(TokenAlgorithm::Rs256, "/nonexistent/key.pem")
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidKey(msg) if msg.contains("/nonexistent/key.pem")));
    }

    #[test]
    fn debug_redacts_private_key() {
        let signing = SigningKey::from_pem(TokenAlgorithm::Rs256, SIGNING_PEM).unwrap();
        let debug = format!("{signing:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("PRIVATE"));
    }
}
