//! # cr-storage
//!
//! Storage abstraction traits for credenta.
//!
//! This crate defines the repository interfaces the authentication core reads
//! and writes through, plus an in-memory implementation.
//!
//! ## Repository Traits
//!
//! - [`UserRepository`] - CRUD operations for users
//! - [`GroupRepository`] - CRUD operations for groups

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod group;
pub mod memory;
pub mod user;

use cr_model::ModelResult;

pub use error::{StorageError, StorageResult};
pub use group::GroupRepository;
pub use memory::{InMemoryGroupRepository, InMemoryUserRepository};
pub use user::UserRepository;

/// In-place edit applied by [`UserRepository::update`] and
/// [`GroupRepository::update`] while the record is locked.
///
/// An `Err` aborts the update and leaves the stored record untouched. The
/// change must not alter the record's realm or key.
pub type Change<'a, T> = Box<dyn FnOnce(&mut T) -> ModelResult<()> + Send + 'a>;
