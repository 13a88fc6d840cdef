//! JWT utilities shared by the app authentication crates.
//!
//! This module provides the checks that run around signature verification:
//! - Size limits for DoS prevention
//! - `Bearer` prefix handling for Authorization header values
//! - Structural validation of the compact JWS form
//! - Expiration validation against the current time
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any decoding
//! - Shape checks never verify a signature; a token that passes
//!   [`check_token_shape`] MUST still be verified against the signer's key
//! - Error messages are generic; detail is logged at debug level
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{check_token_shape, strip_bearer_prefix, validate_exp};
//!
//! let token = strip_bearer_prefix(header).ok_or(...)?;
//! check_token_shape(token)?;
//! // ... verify signature, then:
//! validate_exp(claims.exp)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Pod-issued user tokens carry a handful of claims and an RSA-4096 signature
/// at most, well under 2KB. Anything larger is rejected before base64
/// decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Authorization header scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during JWT pre- and post-verification checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid")]
    TokenTooLarge,

    /// Token format is invalid (not a compact JWS).
    #[error("The access token is invalid")]
    MalformedToken,

    /// Token `exp` claim is at or before the current time.
    #[error("The access token has expired")]
    Expired,
}

// =============================================================================
// Functions
// =============================================================================

/// Strip the mandatory `Bearer ` prefix from an Authorization header value.
///
/// Returns `None` when the prefix is missing or nothing follows it.
#[must_use]
pub fn strip_bearer_prefix(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Check that a token is structurally a compact JWS without verifying it.
///
/// Accepts `header.payload.signature` where every segment is non-empty and the
/// header is a base64url-encoded JSON object.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong segment count, empty segment, bad base64 or
///   a header that is not a JSON object
pub fn check_token_shape(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        tracing::debug!(target: "common.jwt", "Token rejected: empty JWT segment");
        return Err(JwtValidationError::MalformedToken);
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(header).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header_json: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    if !header_json.is_object() {
        return Err(JwtValidationError::MalformedToken);
    }

    Ok(())
}

/// Validate the `exp` claim against the current time.
///
/// A token whose expiration equals the current second is already expired.
///
/// # Errors
///
/// Returns `JwtValidationError::Expired` if `exp` is at or before now.
pub fn validate_exp(exp: i64) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_exp_at(exp, now)
}

/// Deterministic `exp` validation against an explicit `now` timestamp.
///
/// Prefer [`validate_exp`] in production code.
///
/// # Errors
///
/// Returns `JwtValidationError::Expired` if `exp <= now`.
pub fn validate_exp_at(exp: i64, now: i64) -> Result<(), JwtValidationError> {
    if exp <= now {
        tracing::debug!(
            target: "common.jwt",
            exp = exp,
            now = now,
            "Token rejected: expired"
        );
        return Err(JwtValidationError::Expired);
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
