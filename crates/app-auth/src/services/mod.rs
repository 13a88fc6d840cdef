//! Collaborators of the authentication core.
//!
//! Local lookups are synchronous traits; anything that reaches the pod is an
//! `async_trait`. All of them are `Send + Sync` so they can be shared behind
//! `Arc` across request tasks.
//!
//! # Components
//!
//! - `pod_client` - HTTP client implementing every remote trait against a pod
//! - `mock` - In-memory doubles with call counters for tests

pub mod mock;
pub mod pod_client;

pub use pod_client::PodApiClient;

use crate::errors::AuthError;
use crate::models::{AppToken, IntegrationInfo, PodCertificate, PodInfo};
use async_trait::async_trait;
use common::secret::SecretString;
use std::time::Duration;

/// Looks up the integration record for a config id.
pub trait IntegrationResolver: Send + Sync {
    fn get_integration_by_id(&self, config_id: &str) -> Option<IntegrationInfo>;
}

/// Maps config ids to pod application ids.
pub trait ApplicationRegistry: Send + Sync {
    /// # Errors
    ///
    /// `AuthError::Bootstrap` when no application is registered for the id.
    fn get_application_id(&self, config_id: &str) -> Result<String, AuthError>;

    /// Lifetime of a cached public certificate.
    fn get_public_certificate_cache_duration(&self) -> Duration;
}

/// Provides the pod session token an integration acts under.
pub trait SessionAuthority: Send + Sync {
    fn get_session_token(&self, config_id: &str) -> Result<SecretString, AuthError>;
}

/// Fetches the certificate a pod publishes for an application.
#[async_trait]
pub trait RemoteCertificateProvider: Send + Sync {
    async fn get_pod_public_certificate(
        &self,
        application_id: &str,
    ) -> Result<PodCertificate, AuthError>;
}

/// Exchanges a locally generated app token for a token pair.
#[async_trait]
pub trait RemoteAuthHandshake: Send + Sync {
    async fn authenticate(
        &self,
        application_id: &str,
        app_token: &str,
    ) -> Result<AppToken, AuthError>;
}

/// Confirms a token pair the pod has on record.
#[async_trait]
pub trait RemoteSessionValidator: Send + Sync {
    /// Returns `Ok(None)` when the pod knows no pair for `app_token`.
    async fn get_app_authentication_token(
        &self,
        session_token: &SecretString,
        config_id: &str,
        app_token: &str,
    ) -> Result<Option<AppToken>, AuthError>;
}

/// Fetches the identity of the pod.
#[async_trait]
pub trait RemotePodInfoProvider: Send + Sync {
    async fn get_pod_info(&self, session_token: &SecretString) -> Result<PodInfo, AuthError>;
}
