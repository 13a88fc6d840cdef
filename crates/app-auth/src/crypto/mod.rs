//! Cryptographic helpers for app authentication.
//!
//! - PEM decoding of pod certificates into RS512 verification keys
//! - CSPRNG-backed opaque app token generation
//!
//! Nothing here performs I/O.

use crate::errors::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::secret::SecretString;
use jsonwebtoken::DecodingKey;
use ring::rand::{SecureRandom, SystemRandom};
use x509_parser::pem::parse_x509_pem;
use x509_parser::public_key::PublicKey;

/// Number of random bytes in a generated app token (256 bits).
pub const APP_TOKEN_BYTES: usize = 32;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const RSA_PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";

// ============================================================================
// Key material
// ============================================================================

/// Decode a PEM-encoded RSA certificate or public key into a verification key.
///
/// Accepts an X.509 `CERTIFICATE` (the form pods publish), a SubjectPublicKeyInfo
/// `PUBLIC KEY`, or a PKCS#1 `RSA PUBLIC KEY`.
///
/// # Errors
///
/// Returns `AuthError::KeyMaterial` if the input is not PEM, uses an unknown
/// label, cannot be parsed, or carries a non-RSA key.
pub fn decode_public_key_pem(pem: &str) -> Result<DecodingKey, AuthError> {
    let pem = pem.trim();
    if pem.is_empty() {
        return Err(AuthError::KeyMaterial("Empty certificate".to_string()));
    }

    let (_, block) = parse_x509_pem(pem.as_bytes()).map_err(|e| {
        tracing::debug!(target: "auth.crypto", error = %e, "Failed to parse PEM block");
        AuthError::KeyMaterial("Certificate is not valid PEM".to_string())
    })?;

    match block.label.as_str() {
        CERTIFICATE_LABEL => {
            let cert = block.parse_x509().map_err(|e| {
                tracing::debug!(target: "auth.crypto", error = %e, "Failed to parse X.509 certificate");
                AuthError::KeyMaterial("Malformed X.509 certificate".to_string())
            })?;

            if !cert.validity().is_valid() {
                tracing::warn!(
                    target: "auth.crypto",
                    not_after = %cert.validity().not_after,
                    "Pod certificate is outside its validity period"
                );
            }

            let spki = cert.public_key();
            match spki.parsed() {
                Ok(PublicKey::RSA(_)) => {
                    Ok(DecodingKey::from_rsa_der(spki.subject_public_key.data.as_ref()))
                }
                Ok(_) => Err(AuthError::KeyMaterial(
                    "Certificate does not carry an RSA key".to_string(),
                )),
                Err(e) => {
                    tracing::debug!(target: "auth.crypto", error = %e, "Failed to parse certificate public key");
                    Err(AuthError::KeyMaterial(
                        "Malformed certificate public key".to_string(),
                    ))
                }
            }
        }
        PUBLIC_KEY_LABEL | RSA_PUBLIC_KEY_LABEL => DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| {
                tracing::debug!(target: "auth.crypto", error = %e, "Failed to parse RSA public key");
                AuthError::KeyMaterial("Malformed RSA public key".to_string())
            }),
        other => {
            tracing::debug!(target: "auth.crypto", label = %other, "Unsupported PEM label");
            Err(AuthError::KeyMaterial(format!(
                "Unsupported PEM block: {}",
                other
            )))
        }
    }
}

// ============================================================================
// Token generation
// ============================================================================

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, AuthError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| AuthError::Internal(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

/// Source of opaque app tokens.
pub trait TokenGenerator: Send + Sync {
    /// Produce a fresh, unpredictable app token.
    fn generate_token(&self) -> Result<SecretString, AuthError>;
}

/// Default [`TokenGenerator`]: 256 bits from the system CSPRNG, URL-safe
/// base64 without padding.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate_token(&self) -> Result<SecretString, AuthError> {
        let bytes = generate_random_bytes(APP_TOKEN_BYTES)?;
        Ok(SecretString::from(URL_SAFE_NO_PAD.encode(bytes)))
    }
}
