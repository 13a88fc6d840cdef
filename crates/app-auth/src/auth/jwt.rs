//! Pod user JWT validation.
//!
//! Verifies `Authorization: Bearer <jwt>` headers against the signing key the
//! pod publishes for the integration's application.
//!
//! # Security
//!
//! - Tokens are size- and shape-checked BEFORE the certificate is fetched,
//!   so garbage never triggers a remote call
//! - Only RS512 is accepted
//! - Expiration is checked only after the signature verified, and is reported
//!   as a distinct error
//! - A payload is never built from a token whose signature failed
//!
//! # Outcomes
//!
//! [`JwtValidator::get_jwt_token`] treats a missing, malformed or forged token
//! as an absent credential (`Ok(None)`) but an expired one as an error.

use crate::auth::certificate_cache::CertificateCache;
use crate::auth::claims::AppClaims;
use crate::errors::AuthError;
use crate::models::JwtPayload;
use crate::observability::metrics::record_token_validation;
use common::jwt::{check_token_shape, strip_bearer_prefix, validate_exp, JwtValidationError};
use jsonwebtoken::{decode, Algorithm, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Validator for pod-signed user tokens.
pub struct JwtValidator {
    /// Cache of per-config-id verification keys.
    certificate_cache: Arc<CertificateCache>,

    /// RS512 validation rules; `exp` presence is required, its value is
    /// checked separately.
    validation: Validation,
}

impl JwtValidator {
    pub fn new(certificate_cache: Arc<CertificateCache>) -> Self {
        let mut validation = Validation::new(Algorithm::RS512);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            certificate_cache,
            validation,
        }
    }

    /// Validate an Authorization header value.
    ///
    /// Returns `Ok(None)` when the header is missing or empty, lacks the
    /// `Bearer ` prefix, is not a well-formed JWT, or its signature does not
    /// verify against the config id's certificate.
    ///
    /// # Errors
    ///
    /// - `AuthError::Expired` if the signature verified but `exp <= now`
    /// - `AuthError::CertificateLoad` if the signing certificate is unavailable
    #[instrument(skip_all, fields(config_id = %config_id))]
    pub async fn get_jwt_token(
        &self,
        config_id: &str,
        authorization_header: Option<&str>,
    ) -> Result<Option<JwtPayload>, AuthError> {
        let Some(header) = authorization_header.filter(|h| !h.trim().is_empty()) else {
            record_token_validation("absent");
            return Ok(None);
        };

        let Some(token) = strip_bearer_prefix(header) else {
            tracing::debug!(target: "auth.jwt", config_id = %config_id, "Authorization header without Bearer token");
            record_token_validation("absent");
            return Ok(None);
        };

        match self.parse_jwt_payload(config_id, token).await {
            Ok(payload) => {
                record_token_validation("valid");
                Ok(Some(payload))
            }
            Err(AuthError::InvalidToken(_)) => {
                record_token_validation("absent");
                Ok(None)
            }
            Err(AuthError::Expired) => {
                record_token_validation("expired");
                Err(AuthError::Expired)
            }
            Err(e) => {
                record_token_validation("error");
                Err(e)
            }
        }
    }

    /// Verify a raw JWT (no `Bearer ` prefix) and map its claims.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` for structural or signature failures
    /// - `AuthError::Expired` if the signature verified but `exp <= now`
    /// - `AuthError::CertificateLoad` if the signing certificate is unavailable
    pub async fn parse_jwt_payload(
        &self,
        config_id: &str,
        token: &str,
    ) -> Result<JwtPayload, AuthError> {
        check_token_shape(token).map_err(|e| {
            tracing::debug!(target: "auth.jwt", config_id = %config_id, error = ?e, "Token shape check failed");
            AuthError::InvalidToken("The access token is invalid".to_string())
        })?;

        let key = self.certificate_cache.get(config_id).await?;

        let token_data = decode::<AppClaims>(token, &key, &self.validation).map_err(|e| {
            tracing::debug!(target: "auth.jwt", config_id = %config_id, error = %e, "Token verification failed");
            AuthError::InvalidToken("The access token is invalid".to_string())
        })?;
        let claims = token_data.claims;

        validate_exp(claims.exp).map_err(|e| match e {
            JwtValidationError::Expired => AuthError::Expired,
            JwtValidationError::TokenTooLarge | JwtValidationError::MalformedToken => {
                AuthError::InvalidToken("The access token is invalid".to_string())
            }
        })?;

        tracing::debug!(target: "auth.jwt", config_id = %config_id, "Token validated successfully");
        Ok(JwtPayload::from(claims))
    }

    /// Resolve the user id carried by an Authorization header.
    ///
    /// # Errors
    ///
    /// - `AuthError::Unauthorized` if the header yields no payload or the
    ///   payload has no numeric subject
    /// - Any error [`JwtValidator::get_jwt_token`] returns
    pub async fn get_user_id_from_authorization_header(
        &self,
        config_id: &str,
        authorization_header: Option<&str>,
    ) -> Result<i64, AuthError> {
        let payload = self
            .get_jwt_token(config_id, authorization_header)
            .await?;
        get_user_id(payload.as_ref())
    }
}

/// Extract the numeric user id from a verified payload.
///
/// # Errors
///
/// `AuthError::Unauthorized` if the payload is absent, has no subject, or the
/// subject is not an integer.
pub fn get_user_id(payload: Option<&JwtPayload>) -> Result<i64, AuthError> {
    let payload = payload
        .ok_or_else(|| AuthError::Unauthorized("No valid user token".to_string()))?;

    let subject = payload.user_id().ok_or_else(|| {
        tracing::debug!(target: "auth.jwt", "Token has no subject");
        AuthError::Unauthorized("Token has no user id".to_string())
    })?;

    subject.trim().parse::<i64>().map_err(|_| {
        tracing::debug!(target: "auth.jwt", "Token subject is not numeric");
        AuthError::Unauthorized("Token user id is not numeric".to_string())
    })
}
