//! # cr-auth
//!
//! Authentication engine for credenta.
//!
//! This crate turns stored users and groups into authenticated principals:
//! credential schemes and the method-keyed verifier, passphrase policies,
//! group hierarchy role resolution, the authentication orchestrator, and the
//! directory service that administers users and groups.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cr_auth::{Authenticator, DirectoryService, NewUser};
//! use cr_storage::{InMemoryGroupRepository, InMemoryUserRepository};
//!
//! let users = Arc::new(InMemoryUserRepository::new());
//! let groups = Arc::new(InMemoryGroupRepository::new());
//!
//! let directory = DirectoryService::new(users.clone(), groups.clone());
//! directory.create_group("corp", "staff", &[]).await?;
//! directory
//!     .create_user(NewUser::new("corp", "alice", "password1").groups(&["staff"]))
//!     .await?;
//! directory.activate_user("corp", "alice").await?;
//!
//! let auth = Authenticator::new(users, groups);
//! let principal = auth.authenticate("corp", "alice", "password1").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authenticator;
pub mod credential;
pub mod directory;
pub mod error;
pub mod hierarchy;
pub mod password;
pub mod policy;

pub use authenticator::Authenticator;
pub use credential::{CredentialScheme, CredentialVerifier, DigestScheme, PlainScheme};
pub use directory::{DirectoryService, NewUser};
pub use error::{AccountError, AuthError, AuthResult, CredentialError};
pub use hierarchy::HierarchyResolver;
pub use password::{Argon2Scheme, Argon2Settings};
pub use policy::{PassphrasePolicy, SYMBOLS};
