//! Deterministic cryptographic fixtures for testing
//!
//! Provides fixed RSA-2048 key pairs with matching self-signed X.509
//! certificates. Keys are checked in under `fixtures/` so every run signs and
//! verifies with identical material.

use jsonwebtoken::EncodingKey;
use thiserror::Error;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

const PRIMARY_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/primary-key.pem");
const PRIMARY_CERTIFICATE_PEM: &str = include_str!("../fixtures/primary-cert.pem");
const PRIMARY_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/primary-pub.pem");
const ROGUE_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rogue-key.pem");
const ROGUE_CERTIFICATE_PEM: &str = include_str!("../fixtures/rogue-cert.pem");
const EC_CERTIFICATE_PEM: &str = include_str!("../fixtures/ec-cert.pem");

/// An RSA signing key together with the certificate that publishes it.
#[derive(Debug, Clone, Copy)]
pub struct TestKeyPair {
    /// PKCS#1 private key in PEM format.
    pub private_key_pem: &'static str,

    /// Self-signed X.509 certificate carrying the public half.
    pub certificate_pem: &'static str,
}

impl TestKeyPair {
    /// Build a jsonwebtoken encoding key from the private half.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::Crypto` if the PEM cannot be parsed.
    pub fn encoding_key(&self) -> Result<EncodingKey, FixtureError> {
        EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes())
            .map_err(|e| FixtureError::Crypto(format!("Invalid fixture private key: {e}")))
    }
}

/// Key pair whose certificate is served for the test application.
#[must_use]
pub fn primary_key_pair() -> TestKeyPair {
    TestKeyPair {
        private_key_pem: PRIMARY_PRIVATE_KEY_PEM,
        certificate_pem: PRIMARY_CERTIFICATE_PEM,
    }
}

/// Key pair that is never published; tokens signed with it must be rejected.
#[must_use]
pub fn rogue_key_pair() -> TestKeyPair {
    TestKeyPair {
        private_key_pem: ROGUE_PRIVATE_KEY_PEM,
        certificate_pem: ROGUE_CERTIFICATE_PEM,
    }
}

/// Bare SubjectPublicKeyInfo PEM (`BEGIN PUBLIC KEY`) for the primary key.
#[must_use]
pub fn primary_public_key_pem() -> &'static str {
    PRIMARY_PUBLIC_KEY_PEM
}

/// Self-signed certificate carrying a P-256 key (not usable for RS512).
#[must_use]
pub fn ec_certificate_pem() -> &'static str {
    EC_CERTIFICATE_PEM
}
