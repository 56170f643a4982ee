//! # cr-crypto
//!
//! Digest primitives for credenta using aws-lc-rs.
//!
//! Provides the one-way digests behind the MD5/SHA credential schemes, their
//! lowercase-hex encoding, and constant-time comparison. Argon2id lives with
//! the credential schemes in `cr-auth`; token signing lives in `cr-token`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod hash;

pub use algorithm::DigestAlgorithm;
pub use hash::{constant_time_eq, hash, hex_digest, verify_hex_digest};
