//! Authentication entry points for integration applications.
//!
//! The orchestrator owns the certificate cache, the JWT validator and the pod
//! identity verifier, and drives the two token pair flows:
//!
//! - `authenticate` mints an app token and hands it to the pod handshake
//! - `is_valid_token_pair` runs the handshake for a freshly minted token and
//!   confirms the presented pair with the pod's session authority
//!
//! A locally generated pair is never trusted on its own; only the pod's
//! confirmation makes a pair valid.

use crate::auth::certificate_cache::CertificateCache;
use crate::auth::jwt::{self, JwtValidator};
use crate::auth::pod_identity::PodIdentityVerifier;
use crate::crypto::TokenGenerator;
use crate::errors::AuthError;
use crate::models::JwtPayload;
use crate::observability::metrics::record_token_pair_confirmation;
use crate::services::{
    ApplicationRegistry, IntegrationResolver, RemoteAuthHandshake, RemoteCertificateProvider,
    RemotePodInfoProvider, RemoteSessionValidator, SessionAuthority,
};
use common::secret::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::instrument;

/// Collaborators the orchestrator is built from.
#[derive(Clone)]
pub struct AuthDependencies {
    pub integration_resolver: Arc<dyn IntegrationResolver>,
    pub application_registry: Arc<dyn ApplicationRegistry>,
    pub session_authority: Arc<dyn SessionAuthority>,
    pub certificate_provider: Arc<dyn RemoteCertificateProvider>,
    pub auth_handshake: Arc<dyn RemoteAuthHandshake>,
    pub session_validator: Arc<dyn RemoteSessionValidator>,
    pub pod_info_provider: Arc<dyn RemotePodInfoProvider>,
    pub token_generator: Arc<dyn TokenGenerator>,
}

/// App authentication facade.
pub struct AuthenticationOrchestrator {
    integration_resolver: Arc<dyn IntegrationResolver>,
    application_registry: Arc<dyn ApplicationRegistry>,
    session_authority: Arc<dyn SessionAuthority>,
    auth_handshake: Arc<dyn RemoteAuthHandshake>,
    session_validator: Arc<dyn RemoteSessionValidator>,
    token_generator: Arc<dyn TokenGenerator>,
    certificate_cache: Arc<CertificateCache>,
    jwt_validator: JwtValidator,
    pod_identity: PodIdentityVerifier,
}

impl AuthenticationOrchestrator {
    pub fn new(deps: AuthDependencies) -> Self {
        let certificate_cache = Arc::new(CertificateCache::new(
            Arc::clone(&deps.application_registry),
            deps.certificate_provider,
        ));
        let jwt_validator = JwtValidator::new(Arc::clone(&certificate_cache));
        let pod_identity =
            PodIdentityVerifier::new(Arc::clone(&deps.session_authority), deps.pod_info_provider);

        Self {
            integration_resolver: deps.integration_resolver,
            application_registry: deps.application_registry,
            session_authority: deps.session_authority,
            auth_handshake: deps.auth_handshake,
            session_validator: deps.session_validator,
            token_generator: deps.token_generator,
            certificate_cache,
            jwt_validator,
            pod_identity,
        }
    }

    // -------------------------------------------------------------------------
    // Token pairs
    // -------------------------------------------------------------------------

    /// Mint an app token for a config id and register it with the pod.
    ///
    /// Returns the generated app token.
    ///
    /// # Errors
    ///
    /// - `AuthError::Bootstrap` if no application is registered for `config_id`
    /// - Handshake failures propagate unchanged
    #[instrument(skip_all, fields(config_id = %config_id))]
    pub async fn authenticate(&self, config_id: &str) -> Result<SecretString, AuthError> {
        let application_id = self.application_registry.get_application_id(config_id)?;
        let app_token = self.token_generator.generate_token()?;

        self.auth_handshake
            .authenticate(&application_id, app_token.expose_secret())
            .await
            .map_err(|e| {
                tracing::warn!(
                    target: "auth.orchestrator",
                    config_id = %config_id,
                    application_id = %application_id,
                    error = %e,
                    "App authentication handshake failed"
                );
                e
            })?;

        tracing::info!(
            target: "auth.orchestrator",
            config_id = %config_id,
            application_id = %application_id,
            "App authenticated"
        );

        Ok(app_token)
    }

    /// Check a presented app/symphony token pair against the pod.
    ///
    /// A fresh app token is minted and run through the handshake first, so the
    /// integration holds a live pod session; the presented app token is only
    /// ever sent to the pod's token lookup. True only when the pod confirms a
    /// pair whose app and symphony tokens both equal the presented ones. An
    /// unknown pair is `false`.
    ///
    /// # Errors
    ///
    /// - `AuthError::Bootstrap` if the integration or its application is
    ///   unknown, or the resolver returns another integration's record
    /// - Session and remote failures propagate unchanged
    #[instrument(skip_all, fields(config_id = %config_id))]
    pub async fn is_valid_token_pair(
        &self,
        config_id: &str,
        app_token: &str,
        symphony_token: &str,
    ) -> Result<bool, AuthError> {
        let integration = self
            .integration_resolver
            .get_integration_by_id(config_id)
            .ok_or_else(|| {
                tracing::error!(target: "auth.orchestrator", config_id = %config_id, "Integration not found");
                AuthError::Bootstrap(format!("Integration {} not found", config_id))
            })?;

        if integration.config_id != config_id {
            tracing::error!(
                target: "auth.orchestrator",
                config_id = %config_id,
                resolved_config_id = %integration.config_id,
                "Integration resolver returned a foreign record"
            );
            return Err(AuthError::Bootstrap(format!(
                "Integration record for {} belongs to {}",
                config_id, integration.config_id
            )));
        }

        let application_id = self.application_registry.get_application_id(config_id)?;
        let session_token = self.session_authority.get_session_token(config_id)?;

        let reference_token = self.token_generator.generate_token()?;
        self.auth_handshake
            .authenticate(&application_id, reference_token.expose_secret())
            .await?;

        let confirmation = self
            .session_validator
            .get_app_authentication_token(&session_token, config_id, app_token)
            .await?;

        let Some(confirmation) = confirmation else {
            tracing::info!(
                target: "auth.orchestrator",
                config_id = %config_id,
                integration_type = %integration.integration_type,
                "Token pair not known to pod"
            );
            record_token_pair_confirmation("unknown");
            return Ok(false);
        };

        let valid = confirmation.app_token() == app_token
            && confirmation.symphony_token() == symphony_token;

        if valid {
            record_token_pair_confirmation("match");
        } else {
            tracing::warn!(
                target: "auth.orchestrator",
                config_id = %config_id,
                integration_type = %integration.integration_type,
                "Token pair mismatch"
            );
            record_token_pair_confirmation("mismatch");
        }

        Ok(valid)
    }

    // -------------------------------------------------------------------------
    // User tokens
    // -------------------------------------------------------------------------

    /// See [`JwtValidator::get_jwt_token`].
    pub async fn get_jwt_token(
        &self,
        config_id: &str,
        authorization_header: Option<&str>,
    ) -> Result<Option<JwtPayload>, AuthError> {
        self.jwt_validator
            .get_jwt_token(config_id, authorization_header)
            .await
    }

    /// See [`JwtValidator::parse_jwt_payload`].
    pub async fn parse_jwt_payload(
        &self,
        config_id: &str,
        token: &str,
    ) -> Result<JwtPayload, AuthError> {
        self.jwt_validator.parse_jwt_payload(config_id, token).await
    }

    /// See [`jwt::get_user_id`].
    pub fn get_user_id(&self, payload: Option<&JwtPayload>) -> Result<i64, AuthError> {
        jwt::get_user_id(payload)
    }

    /// See [`JwtValidator::get_user_id_from_authorization_header`].
    pub async fn get_user_id_from_authorization_header(
        &self,
        config_id: &str,
        authorization_header: Option<&str>,
    ) -> Result<i64, AuthError> {
        self.jwt_validator
            .get_user_id_from_authorization_header(config_id, authorization_header)
            .await
    }

    /// Drop the cached signing key for one config id.
    pub fn invalidate_certificate(&self, config_id: &str) {
        self.certificate_cache.invalidate(config_id);
    }

    /// Drop every cached signing key.
    pub fn clear_certificates(&self) {
        self.certificate_cache.clear();
    }

    // -------------------------------------------------------------------------
    // Pod identity
    // -------------------------------------------------------------------------

    /// See [`PodIdentityVerifier::check_pod_info`].
    pub async fn check_pod_info(
        &self,
        config_id: &str,
        expected_pod_id: Option<&str>,
    ) -> Result<bool, AuthError> {
        self.pod_identity
            .check_pod_info(config_id, expected_pod_id)
            .await
    }

    /// Forget the cached pod identity.
    pub async fn reset_pod_info(&self) {
        self.pod_identity.reset().await;
    }
}
