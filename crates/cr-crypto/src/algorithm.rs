//! Digest algorithm definitions.
//!
//! MD5 and SHA-1 are broken for collision resistance. They are kept only to
//! verify credentials that were stored with them before stronger schemes were
//! available; new credentials should use Argon2id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One-way digest algorithms used for stored credential hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// MD5 (legacy).
    #[serde(rename = "MD5")]
    Md5,

    /// SHA-1 (legacy).
    #[serde(rename = "SHA1")]
    Sha1,

    /// SHA-256.
    #[serde(rename = "SHA256")]
    Sha256,

    /// SHA-512.
    #[serde(rename = "SHA512")]
    Sha512,
}

impl DigestAlgorithm {
    /// All supported digests.
    pub const ALL: [Self; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Returns the tag used for stored credentials.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
