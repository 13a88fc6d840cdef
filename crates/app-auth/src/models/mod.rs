//! Data models for app authentication.
//!
//! Token-bearing types implement `Debug` by hand so that app tokens, symphony
//! tokens and user ids never reach logs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// AppToken
// =============================================================================

/// A confirmed app/symphony token pair for one integration.
///
/// Only produced by a successful remote handshake or confirmation, or by
/// deserializing a pod response. On the wire the config id travels as `appId`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppToken {
    #[serde(rename = "appId")]
    config_id: String,

    #[serde(rename = "appToken")]
    app_token: String,

    #[serde(rename = "symphonyToken")]
    symphony_token: String,
}

impl AppToken {
    pub fn new(
        config_id: impl Into<String>,
        app_token: impl Into<String>,
        symphony_token: impl Into<String>,
    ) -> Self {
        Self {
            config_id: config_id.into(),
            app_token: app_token.into(),
            symphony_token: symphony_token.into(),
        }
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    pub fn app_token(&self) -> &str {
        &self.app_token
    }

    pub fn symphony_token(&self) -> &str {
        &self.symphony_token
    }
}

impl fmt::Debug for AppToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppToken")
            .field("config_id", &self.config_id)
            .field("app_token", &"[REDACTED]")
            .field("symphony_token", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// JwtPayload
// =============================================================================

/// Claims of a pod-issued user JWT whose signature verified.
///
/// There is no way to build one from an unverified token inside this crate;
/// [`JwtPayload::new`] exists for callers that fabricate payloads in tests.
#[derive(Clone, PartialEq)]
pub struct JwtPayload {
    application_id: Option<String>,
    company_name: Option<String>,
    user_id: Option<String>,
    expiration_epoch_seconds: i64,
    extra_claims: BTreeMap<String, Value>,
}

impl JwtPayload {
    pub fn new(
        application_id: Option<String>,
        company_name: Option<String>,
        user_id: Option<String>,
        expiration_epoch_seconds: i64,
        extra_claims: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            application_id,
            company_name,
            user_id,
            expiration_epoch_seconds,
            extra_claims,
        }
    }

    /// Audience (`aud`).
    pub fn application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    /// Issuer (`iss`).
    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    /// Subject (`sub`), the pod user id as a string.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Expiration (`exp`) in Unix epoch seconds.
    pub fn expiration_epoch_seconds(&self) -> i64 {
        self.expiration_epoch_seconds
    }

    /// Claims other than `sub`, `exp`, `aud` and `iss`.
    pub fn extra_claims(&self) -> &BTreeMap<String, Value> {
        &self.extra_claims
    }
}

impl fmt::Debug for JwtPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtPayload")
            .field("application_id", &self.application_id)
            .field("company_name", &self.company_name)
            .field("user_id", &"[REDACTED]")
            .field("expiration_epoch_seconds", &self.expiration_epoch_seconds)
            .field("extra_claims", &self.extra_claims.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Pod data
// =============================================================================

/// PEM certificate the pod publishes for one application id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodCertificate {
    pub certificate: String,
}

/// Identity of the pod this integration is deployed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub pod_id: String,

    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub external_pod_id: Option<String>,
}

impl PodInfo {
    pub fn new(pod_id: impl Into<String>, external_pod_id: Option<String>) -> Self {
        Self {
            pod_id: pod_id.into(),
            external_pod_id,
        }
    }

    /// True when `expected` names this pod.
    pub fn verify_pod_id(&self, expected: &str) -> bool {
        !expected.is_empty() && self.pod_id == expected
    }
}

/// Integration record returned by an [`IntegrationResolver`].
///
/// [`IntegrationResolver`]: crate::services::IntegrationResolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationInfo {
    pub config_id: String,
    pub integration_type: String,
}

impl IntegrationInfo {
    pub fn new(config_id: impl Into<String>, integration_type: impl Into<String>) -> Self {
        Self {
            config_id: config_id.into(),
            integration_type: integration_type.into(),
        }
    }
}

// Pods report ids as JSON numbers on some versions and strings on others.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

pub(crate) fn optional_string_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}
