//! # cr-model
//!
//! Domain models for credenta (Group, User, Credential, Principal).
//!
//! Entities are plain values: they are created by the directory service,
//! persisted through the repository traits in `cr-storage`, and mutated in
//! place by role and attribute operations. [`RoleMask`] is the fixed-capacity
//! bit set every entity uses to carry granted role ids.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod credential;
pub mod error;
pub mod group;
pub mod principal;
pub mod role_mask;
pub mod user;

pub use attribute::{Attributable, Attribute, AttributeValue, Attributes};
pub use credential::{Credential, VerificationMethod};
pub use error::{ModelError, ModelResult};
pub use group::Group;
pub use principal::Principal;
pub use role_mask::{RoleId, RoleMask, DEFAULT_MASK_WORDS};
pub use user::{IdType, User};
