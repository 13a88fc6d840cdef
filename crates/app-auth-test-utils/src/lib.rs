//! # App Auth Test Utilities
//!
//! Shared test utilities for the `app-auth` crate.
//!
//! This crate provides:
//! - Deterministic RSA / X.509 fixtures (fixed keys for reproducible tests)
//! - A claims builder that signs RS512 tokens (`TestTokenBuilder`)
//! - Fixed test IDs (config ids, application ids, tokens)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use app_auth_test_utils::*;
//!
//! let token = TestTokenBuilder::new()
//!     .for_user(TEST_USER_ID)
//!     .expires_in(3600)
//!     .sign_with(&primary_key_pair())?;
//!
//! let header = bearer(&token);
//! ```

pub mod crypto_fixtures;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use test_ids::*;
pub use token_builders::*;
