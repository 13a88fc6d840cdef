//! In-memory collaborator doubles.
//!
//! Every mock counts its calls so tests can assert how often the pod would
//! have been contacted. Remote mocks can be switched into a failing mode.

use super::*;
use crate::crypto::TokenGenerator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Local collaborators
// ============================================================================

/// Resolver backed by a fixed set of integrations.
#[derive(Default)]
pub struct MockIntegrationResolver {
    integrations: HashMap<String, IntegrationInfo>,
    call_count: AtomicUsize,
}

impl MockIntegrationResolver {
    /// Resolver that knows no integrations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolver that knows exactly one integration.
    pub fn with_integration(config_id: &str, integration_type: &str) -> Self {
        Self::empty().and_integration(config_id, integration_type)
    }

    /// Register one more integration.
    pub fn and_integration(mut self, config_id: &str, integration_type: &str) -> Self {
        self.integrations.insert(
            config_id.to_string(),
            IntegrationInfo::new(config_id, integration_type),
        );
        self
    }

    /// Return `record` for lookups of `config_id`, whatever id it carries.
    pub fn and_record(mut self, config_id: &str, record: IntegrationInfo) -> Self {
        self.integrations.insert(config_id.to_string(), record);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl IntegrationResolver for MockIntegrationResolver {
    fn get_integration_by_id(&self, config_id: &str) -> Option<IntegrationInfo> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.integrations.get(config_id).cloned()
    }
}

/// Registry backed by a fixed config id -> application id map.
pub struct MockApplicationRegistry {
    applications: HashMap<String, String>,
    cache_duration: Duration,
    call_count: AtomicUsize,
}

impl MockApplicationRegistry {
    pub fn new(cache_duration: Duration) -> Self {
        Self {
            applications: HashMap::new(),
            cache_duration,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Map `config_id` to `application_id`.
    pub fn with_application(mut self, config_id: &str, application_id: &str) -> Self {
        self.applications
            .insert(config_id.to_string(), application_id.to_string());
        self
    }

    /// Number of `get_application_id` calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl ApplicationRegistry for MockApplicationRegistry {
    fn get_application_id(&self, config_id: &str) -> Result<String, AuthError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.applications.get(config_id).cloned().ok_or_else(|| {
            AuthError::Bootstrap(format!("No application registered for {}", config_id))
        })
    }

    fn get_public_certificate_cache_duration(&self) -> Duration {
        self.cache_duration
    }
}

/// Session authority that hands out one fixed session token.
pub struct MockSessionAuthority {
    session_token: Option<String>,
    call_count: AtomicUsize,
}

impl MockSessionAuthority {
    pub fn with_token(session_token: &str) -> Self {
        Self {
            session_token: Some(session_token.to_string()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Authority with no session; every lookup fails with `Unauthorized`.
    pub fn without_session() -> Self {
        Self {
            session_token: None,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl SessionAuthority for MockSessionAuthority {
    fn get_session_token(&self, config_id: &str) -> Result<SecretString, AuthError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.session_token
            .as_deref()
            .map(SecretString::from)
            .ok_or_else(|| AuthError::Unauthorized(format!("No session for {}", config_id)))
    }
}

/// Token generator that always returns the same token.
pub struct FixedTokenGenerator {
    token: String,
    call_count: AtomicUsize,
}

impl FixedTokenGenerator {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl TokenGenerator for FixedTokenGenerator {
    fn generate_token(&self) -> Result<SecretString, AuthError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(SecretString::from(self.token.clone()))
    }
}

// ============================================================================
// Remote collaborators
// ============================================================================

/// Certificate provider serving PEM strings per application id.
///
/// Certificates can be swapped at runtime to simulate rotation, and an
/// optional delay keeps a load in flight long enough for concurrent callers
/// to pile up behind it.
#[derive(Default)]
pub struct MockCertificateProvider {
    certificates: Mutex<HashMap<String, String>>,
    delay: Option<Duration>,
    failure: Option<AuthError>,
    call_count: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockCertificateProvider {
    /// Provider that serves `certificate_pem` for `application_id`.
    pub fn with_certificate(application_id: &str, certificate_pem: &str) -> Self {
        let provider = Self::default();
        provider.set_certificate(application_id, certificate_pem);
        provider
    }

    /// Provider whose every call fails with `error`.
    pub fn failing(error: AuthError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Sleep for `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Publish (or replace) the certificate for an application id.
    pub fn set_certificate(&self, application_id: &str, certificate_pem: &str) {
        lock(&self.certificates).insert(application_id.to_string(), certificate_pem.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of calls made for one application id.
    pub fn calls_for(&self, application_id: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|id| id.as_str() == application_id)
            .count()
    }
}

#[async_trait]
impl RemoteCertificateProvider for MockCertificateProvider {
    async fn get_pod_public_certificate(
        &self,
        application_id: &str,
    ) -> Result<PodCertificate, AuthError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.calls).push(application_id.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        lock(&self.certificates)
            .get(application_id)
            .map(|certificate| PodCertificate {
                certificate: certificate.clone(),
            })
            .ok_or_else(|| {
                AuthError::Remote(format!("No certificate published for {}", application_id))
            })
    }
}

/// Handshake that pairs every app token with a fixed symphony token.
pub struct MockAuthHandshake {
    symphony_token: String,
    failure: Option<AuthError>,
    call_count: AtomicUsize,
    app_tokens: Mutex<Vec<String>>,
}

impl MockAuthHandshake {
    pub fn with_symphony_token(symphony_token: &str) -> Self {
        Self {
            symphony_token: symphony_token.to_string(),
            failure: None,
            call_count: AtomicUsize::new(0),
            app_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_symphony_token("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// App tokens received, in call order.
    pub fn received_app_tokens(&self) -> Vec<String> {
        lock(&self.app_tokens).clone()
    }
}

#[async_trait]
impl RemoteAuthHandshake for MockAuthHandshake {
    async fn authenticate(
        &self,
        application_id: &str,
        app_token: &str,
    ) -> Result<AppToken, AuthError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.app_tokens).push(app_token.to_string());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(AppToken::new(
            application_id,
            app_token,
            self.symphony_token.clone(),
        ))
    }
}

/// Session validator that confirms only the pairs it was told about.
#[derive(Default)]
pub struct MockSessionValidator {
    confirmed: Mutex<HashMap<String, AppToken>>,
    failure: Option<AuthError>,
    call_count: AtomicUsize,
}

impl MockSessionValidator {
    /// Validator that knows no pairs; every lookup returns `None`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validator that confirms `app_token` with `symphony_token`.
    pub fn confirming(config_id: &str, app_token: &str, symphony_token: &str) -> Self {
        let validator = Self::default();
        validator.confirm(AppToken::new(config_id, app_token, symphony_token));
        validator
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Record a pair the pod will confirm, keyed by its app token.
    pub fn confirm(&self, token: AppToken) {
        lock(&self.confirmed).insert(token.app_token().to_string(), token);
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSessionValidator for MockSessionValidator {
    async fn get_app_authentication_token(
        &self,
        _session_token: &SecretString,
        _config_id: &str,
        app_token: &str,
    ) -> Result<Option<AppToken>, AuthError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(lock(&self.confirmed).get(app_token).cloned())
    }
}

/// Pod info provider returning a fixed identity.
pub struct MockPodInfoProvider {
    pod_info: Option<PodInfo>,
    failure: Option<AuthError>,
    call_count: AtomicUsize,
}

impl MockPodInfoProvider {
    pub fn returning(pod_info: PodInfo) -> Self {
        Self {
            pod_info: Some(pod_info),
            failure: None,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            pod_info: None,
            failure: Some(error),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemotePodInfoProvider for MockPodInfoProvider {
    async fn get_pod_info(&self, _session_token: &SecretString) -> Result<PodInfo, AuthError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        self.pod_info
            .clone()
            .ok_or_else(|| AuthError::Remote("Pod info unavailable".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_certificate_provider_counts_per_application() {
        let provider = MockCertificateProvider::with_certificate("app-a", "pem-a");
        provider.set_certificate("app-b", "pem-b");

        let cert = provider.get_pod_public_certificate("app-a").await.unwrap();
        assert_eq!(cert.certificate, "pem-a");
        provider.get_pod_public_certificate("app-b").await.unwrap();
        provider.get_pod_public_certificate("app-a").await.unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.calls_for("app-a"), 2);
        assert_eq!(provider.calls_for("app-b"), 1);
    }

    #[tokio::test]
    async fn test_certificate_provider_unknown_application() {
        let provider = MockCertificateProvider::default();
        assert!(matches!(
            provider.get_pod_public_certificate("nope").await,
            Err(AuthError::Remote(_))
        ));
    }

    #[tokio::test]
    async fn test_handshake_records_tokens() {
        let handshake = MockAuthHandshake::with_symphony_token("sym");
        let pair = handshake.authenticate("app", "tok-1").await.unwrap();

        assert_eq!(pair.app_token(), "tok-1");
        assert_eq!(pair.symphony_token(), "sym");
        assert_eq!(handshake.received_app_tokens(), vec!["tok-1".to_string()]);
    }

    #[tokio::test]
    async fn test_session_validator_confirms_known_pairs_only() {
        let validator = MockSessionValidator::confirming("jira", "app", "sym");
        let session = SecretString::from("session");

        let found = validator
            .get_app_authentication_token(&session, "jira", "app")
            .await
            .unwrap();
        assert_eq!(found.unwrap().symphony_token(), "sym");

        let missing = validator
            .get_app_authentication_token(&session, "jira", "other")
            .await
            .unwrap();
        assert!(missing.is_none());
        assert_eq!(validator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_pod_info_provider_failing() {
        let provider = MockPodInfoProvider::failing(AuthError::Remote("down".to_string()));
        let session = SecretString::from("session");

        assert_eq!(
            provider.get_pod_info(&session).await.unwrap_err(),
            AuthError::Remote("down".to_string())
        );
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_session_authority_without_session() {
        let authority = MockSessionAuthority::without_session();
        assert!(matches!(
            authority.get_session_token("jira"),
            Err(AuthError::Unauthorized(_))
        ));
    }
}
