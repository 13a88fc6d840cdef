//! App authentication error types.
//!
//! An absent credential is not an error: validators return `Ok(None)` for it.
//! Everything here is a failure the caller must act on. Messages carried in
//! variants are safe to log; they never contain token material.

use thiserror::Error;

/// App authentication error type.
///
/// `Clone` so that a single-flight certificate load can hand the same failure
/// to every waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Token could not be parsed or its signature did not verify.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Signature verified but the `exp` claim is at or before now.
    #[error("The access token has expired")]
    Expired,

    /// No usable user identity for the request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Deployment is misconfigured (unknown integration or application).
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    /// Certificate or public key could not be decoded.
    #[error("Invalid key material: {0}")]
    KeyMaterial(String),

    /// A remote pod call failed.
    #[error("Remote call failed: {0}")]
    Remote(String),

    /// Loading the signing certificate for a config id failed.
    #[error("Failed to load public certificate for {config_id}: {source}")]
    CertificateLoad {
        config_id: String,
        #[source]
        source: Box<AuthError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Bounded error category, used as a metric label.
    pub fn category(&self) -> &'static str {
        match self {
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::Expired => "expired",
            AuthError::Unauthorized(_) => "unauthorized",
            AuthError::Bootstrap(_) => "bootstrap",
            AuthError::KeyMaterial(_) => "key_material",
            AuthError::Remote(_) => "remote",
            AuthError::CertificateLoad { .. } => "certificate_load",
            AuthError::Internal(_) => "internal",
        }
    }

    /// Wrap a fetch or decode failure as a certificate-load failure.
    pub fn certificate_load(config_id: &str, source: AuthError) -> Self {
        AuthError::CertificateLoad {
            config_id: config_id.to_string(),
            source: Box::new(source),
        }
    }
}
