//! Pod API HTTP client.
//!
//! Implements every remote collaborator trait against a single pod base URL.
//!
//! # Security
//!
//! - Session tokens travel only in the `sessionToken` header and are never logged
//! - Path segments are percent-escaped; ids never splice raw into the URL
//! - Timeouts prevent hanging connections
//! - No retries: failures surface to the caller as `AuthError::Remote`

use crate::config::Config;
use crate::errors::AuthError;
use crate::models::{AppToken, PodCertificate, PodInfo};
use crate::observability::metrics::record_remote_call;
use crate::services::{
    RemoteAuthHandshake, RemoteCertificateProvider, RemotePodInfoProvider, RemoteSessionValidator,
};
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Header carrying the pod session token.
pub const SESSION_TOKEN_HEADER: &str = "sessionToken";

const CONNECT_TIMEOUT_SECS: u64 = 5;

const OP_GET_CERTIFICATE: &str = "get_certificate";
const OP_AUTHENTICATE: &str = "authenticate";
const OP_GET_APP_TOKEN: &str = "get_app_token";
const OP_GET_POD_INFO: &str = "get_pod_info";

/// Body of the extension-app authentication request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateRequest<'a> {
    application_id: &'a str,
    app_token: &'a str,
}

/// `podInfo` responses wrap the identity in a `data` envelope.
#[derive(Debug, Deserialize)]
struct PodInfoEnvelope {
    data: PodInfo,
}

/// HTTP client for the pod API.
#[derive(Clone)]
pub struct PodApiClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Pod base URL; endpoint paths are appended to it.
    base_url: Url,
}

impl PodApiClient {
    /// Create a new pod API client.
    ///
    /// # Errors
    ///
    /// - `AuthError::Bootstrap` if `base_url` is not an absolute http(s) URL
    /// - `AuthError::Internal` if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            error!(target: "auth.pod_client", error = %e, "Invalid pod base URL");
            AuthError::Bootstrap(format!("Invalid pod base URL: {}", e))
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(AuthError::Bootstrap(format!(
                "Pod base URL must be http(s): {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| {
                error!(target: "auth.pod_client", error = %e, "Failed to build HTTP client");
                AuthError::Internal("Failed to build HTTP client".to_string())
            })?;

        Ok(Self { client, base_url })
    }

    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// `AuthError::Bootstrap` if no pod URL is configured.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let pod_url = config.pod_url.as_deref().ok_or_else(|| {
            AuthError::Bootstrap("APP_AUTH_POD_URL is not configured".to_string())
        })?;
        Self::new(pod_url, config.http_timeout())
    }

    /// Append escaped path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AuthError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AuthError::Internal("Pod base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, mapping transport failures.
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, AuthError> {
        request.send().await.map_err(|e| {
            warn!(target: "auth.pod_client", operation, error = %e, "Pod request failed");
            AuthError::Remote("Pod API is unreachable".to_string())
        })
    }

    async fn get_pod_public_certificate_inner(
        &self,
        application_id: &str,
    ) -> Result<PodCertificate, AuthError> {
        let url = self.endpoint(&["v1", "app", application_id, "certificate"])?;
        let response = self.send(OP_GET_CERTIFICATE, self.client.get(url)).await?;
        parse_json(OP_GET_CERTIFICATE, check_status(OP_GET_CERTIFICATE, response)?).await
    }

    async fn authenticate_inner(
        &self,
        application_id: &str,
        app_token: &str,
    ) -> Result<AppToken, AuthError> {
        let url = self.endpoint(&["v1", "authenticate", "extension-app"])?;
        let body = AuthenticateRequest {
            application_id,
            app_token,
        };
        let response = self
            .send(OP_AUTHENTICATE, self.client.post(url).json(&body))
            .await?;
        parse_json(OP_AUTHENTICATE, check_status(OP_AUTHENTICATE, response)?).await
    }

    async fn get_app_authentication_token_inner(
        &self,
        session_token: &SecretString,
        config_id: &str,
        app_token: &str,
    ) -> Result<Option<AppToken>, AuthError> {
        let url = self.endpoint(&["v1", "configuration", config_id, "auth", "token", app_token])?;
        let request = self
            .client
            .get(url)
            .header(SESSION_TOKEN_HEADER, session_token.expose_secret());
        let response = self.send(OP_GET_APP_TOKEN, request).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        parse_json(OP_GET_APP_TOKEN, check_status(OP_GET_APP_TOKEN, response)?)
            .await
            .map(Some)
    }

    async fn get_pod_info_inner(&self, session_token: &SecretString) -> Result<PodInfo, AuthError> {
        let url = self.endpoint(&["webcontroller", "public", "podInfo"])?;
        let request = self
            .client
            .get(url)
            .header(SESSION_TOKEN_HEADER, session_token.expose_secret());
        let response = self.send(OP_GET_POD_INFO, request).await?;

        let envelope: PodInfoEnvelope =
            parse_json(OP_GET_POD_INFO, check_status(OP_GET_POD_INFO, response)?).await?;
        Ok(envelope.data)
    }
}

/// Map non-success statuses to `AuthError::Remote`.
fn check_status(operation: &'static str, response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.is_server_error() {
        warn!(target: "auth.pod_client", operation, status = %status, "Pod returned server error");
    } else {
        warn!(target: "auth.pod_client", operation, status = %status, "Pod rejected request");
    }
    Err(AuthError::Remote(format!(
        "Pod API returned status {}",
        status.as_u16()
    )))
}

async fn parse_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, AuthError> {
    response.json().await.map_err(|e| {
        error!(target: "auth.pod_client", operation, error = %e, "Failed to parse pod response");
        AuthError::Remote("Invalid pod API response".to_string())
    })
}

fn call_status<T>(result: &Result<T, AuthError>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

#[async_trait]
impl RemoteCertificateProvider for PodApiClient {
    #[instrument(skip_all, fields(application_id = %application_id))]
    async fn get_pod_public_certificate(
        &self,
        application_id: &str,
    ) -> Result<PodCertificate, AuthError> {
        let start = Instant::now();
        let result = self.get_pod_public_certificate_inner(application_id).await;
        record_remote_call(OP_GET_CERTIFICATE, call_status(&result), start.elapsed());
        result
    }
}

#[async_trait]
impl RemoteAuthHandshake for PodApiClient {
    #[instrument(skip_all, fields(application_id = %application_id))]
    async fn authenticate(
        &self,
        application_id: &str,
        app_token: &str,
    ) -> Result<AppToken, AuthError> {
        let start = Instant::now();
        let result = self.authenticate_inner(application_id, app_token).await;
        record_remote_call(OP_AUTHENTICATE, call_status(&result), start.elapsed());
        result
    }
}

#[async_trait]
impl RemoteSessionValidator for PodApiClient {
    #[instrument(skip_all, fields(config_id = %config_id))]
    async fn get_app_authentication_token(
        &self,
        session_token: &SecretString,
        config_id: &str,
        app_token: &str,
    ) -> Result<Option<AppToken>, AuthError> {
        let start = Instant::now();
        let result = self
            .get_app_authentication_token_inner(session_token, config_id, app_token)
            .await;
        record_remote_call(OP_GET_APP_TOKEN, call_status(&result), start.elapsed());
        result
    }
}

#[async_trait]
impl RemotePodInfoProvider for PodApiClient {
    #[instrument(skip_all)]
    async fn get_pod_info(&self, session_token: &SecretString) -> Result<PodInfo, AuthError> {
        let start = Instant::now();
        let result = self.get_pod_info_inner(session_token).await;
        record_remote_call(OP_GET_POD_INFO, call_status(&result), start.elapsed());
        result
    }
}
