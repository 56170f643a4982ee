//! End-to-end integration tests.
//!
//! These tests drive the directory, authenticator and token service
//! together over in-memory repositories.

mod common;
mod auth_flows;
mod hierarchy;
mod token_operations;
