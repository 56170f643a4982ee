//! Hash functions for credenta.
//!
//! SHA digests come from aws-lc-rs. aws-lc-rs does not expose MD5, so that
//! one is computed with the RustCrypto `md-5` crate.

use aws_lc_rs::{constant_time, digest};
use md5::{Digest, Md5};

use crate::algorithm::DigestAlgorithm;

/// Computes a digest of the input data.
#[must_use]
pub fn hash(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    let alg = match algorithm {
        DigestAlgorithm::Md5 => return Md5::digest(data).to_vec(),
        DigestAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
        DigestAlgorithm::Sha256 => &digest::SHA256,
        DigestAlgorithm::Sha512 => &digest::SHA512,
    };

    digest::digest(alg, data).as_ref().to_vec()
}

/// Computes a digest and returns it as lowercase hex.
#[must_use]
pub fn hex_digest(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    hex::encode(hash(algorithm, data))
}

/// Compares two byte strings in time independent of where they differ.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    constant_time::verify_slices_are_equal(a, b).is_ok()
}

/// Checks `data` against a stored hex digest.
///
/// The stored digest is compared case-insensitively; anything that is not
/// valid hex of the right length simply fails to match.
#[must_use]
pub fn verify_hex_digest(algorithm: DigestAlgorithm, data: &[u8], expected_hex: &str) -> bool {
    let Ok(expected) = hex::decode(expected_hex.trim()) else {
        return false;
    };
    if expected.len() != algorithm.output_len() {
        return false;
    }
    constant_time_eq(&hash(algorithm, data), &expected)
}
