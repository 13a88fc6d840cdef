//! Common utilities shared across the app authentication crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for bearer-token and JWT shape utilities (size limits, prefix, expiration)
pub mod jwt;
