//! # cr-core
//!
//! Core utilities, configuration, and error handling for the credenta
//! identity core.
//!
//! This crate provides foundational types shared by every other `cr-*`
//! crate: the deployment [`Config`], the outward-facing [`Error`] taxonomy,
//! and the tracing bootstrap in [`telemetry`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{Config, MAX_TOKEN_LIFESPAN_SECS, PassphrasePolicyKind, TokenSettings};
pub use error::{Error, Result};
