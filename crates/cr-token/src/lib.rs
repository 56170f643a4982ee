//! # cr-token
//!
//! Signed bearer tokens for credenta.
//!
//! Access and refresh tokens are compact JWS tokens signed with RSA
//! (RS256 by default). They are self-contained and self-expiring: there is
//! no server-side token state and no revocation.
//!
//! ## Example
//!
//! ```ignore
//! use chrono::Duration;
//! use cr_token::{SigningKey, TokenAlgorithm, TokenService, VerifyingKey};
//!
//! let service = TokenService::new(
//!     "credenta",
//!     SigningKey::from_pem_file(TokenAlgorithm::Rs256, "signing_key.pem")?,
//!     VerifyingKey::from_pem_file(TokenAlgorithm::Rs256, "verifying_key.pem")?,
//! )
//! .with_access_ttl(Duration::minutes(5));
//!
//! let pair = service.issue_for_principal(&principal, &["api".to_string()])?;
//! let claims = service.validate(&pair.access_token)?;
//! let access = service.refresh(&pair.refresh_token)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod error;
pub mod keys;
pub mod service;

pub use claims::{AdditionalClaims, Audience, ClaimSet, ClaimValue, RESERVED_CLAIMS, TokenType};
pub use error::{TokenError, TokenResult};
pub use keys::{SigningKey, TokenAlgorithm, VerifyingKey};
pub use service::{
    REALM_CLAIM, TokenPair, TokenRequest, TokenService, issue, issue_pair, refresh, refresh_at,
    validate, validate_at,
};
