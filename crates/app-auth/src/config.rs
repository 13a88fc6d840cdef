//! App authentication configuration.
//!
//! Configuration is loaded from environment variables. The config also serves
//! as the [`ApplicationRegistry`] mapping integration config ids to the pod
//! application ids their certificates are published under.

use crate::errors::AuthError;
use crate::services::ApplicationRegistry;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default public certificate cache lifetime in seconds (1 hour).
pub const DEFAULT_PUBLIC_CERT_CACHE_SECONDS: u64 = 3600;

/// Maximum public certificate cache lifetime in seconds (1 day).
pub const MAX_PUBLIC_CERT_CACHE_SECONDS: u64 = 86_400;

/// Default HTTP timeout for pod API calls in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Maximum HTTP timeout for pod API calls in seconds.
pub const MAX_HTTP_TIMEOUT_SECONDS: u64 = 120;

/// App authentication configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Integration config id -> pod application id.
    pub applications: BTreeMap<String, String>,

    /// How long a decoded public certificate stays cached.
    pub public_cert_cache_seconds: u64,

    /// Base URL of the pod API, when this process talks to a pod directly.
    pub pod_url: Option<String>,

    /// Timeout applied to every pod API request.
    pub http_timeout_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid application mapping: {0}")]
    InvalidApplications(String),

    #[error("Invalid public certificate cache duration: {0}")]
    InvalidCacheDuration(String),

    #[error("Invalid HTTP timeout configuration: {0}")]
    InvalidHttpTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw_applications = vars
            .get("APP_AUTH_APPLICATIONS")
            .ok_or_else(|| ConfigError::MissingEnvVar("APP_AUTH_APPLICATIONS".to_string()))?;
        let applications = parse_applications(raw_applications)?;

        let public_cert_cache_seconds =
            if let Some(value_str) = vars.get("APP_AUTH_PUBLIC_CERT_CACHE_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidCacheDuration(format!(
                        "APP_AUTH_PUBLIC_CERT_CACHE_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_PUBLIC_CERT_CACHE_SECONDS {
                    return Err(ConfigError::InvalidCacheDuration(format!(
                        "APP_AUTH_PUBLIC_CERT_CACHE_SECONDS must be between 1 and {}, got {}",
                        MAX_PUBLIC_CERT_CACHE_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_PUBLIC_CERT_CACHE_SECONDS
            };

        let pod_url = vars
            .get("APP_AUTH_POD_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let http_timeout_seconds = if let Some(value_str) = vars.get("APP_AUTH_HTTP_TIMEOUT_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidHttpTimeout(format!(
                    "APP_AUTH_HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_HTTP_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidHttpTimeout(format!(
                    "APP_AUTH_HTTP_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                    MAX_HTTP_TIMEOUT_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_HTTP_TIMEOUT_SECONDS
        };

        Ok(Config {
            applications,
            public_cert_cache_seconds,
            pod_url,
            http_timeout_seconds,
        })
    }

    /// Timeout for pod API requests.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

impl ApplicationRegistry for Config {
    fn get_application_id(&self, config_id: &str) -> Result<String, AuthError> {
        self.applications.get(config_id).cloned().ok_or_else(|| {
            tracing::warn!(target: "auth.config", config_id = %config_id, "No application registered for config id");
            AuthError::Bootstrap(format!("No application registered for {}", config_id))
        })
    }

    fn get_public_certificate_cache_duration(&self) -> Duration {
        Duration::from_secs(self.public_cert_cache_seconds)
    }
}

/// Parse `configId=applicationId` pairs separated by commas.
fn parse_applications(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut applications = BTreeMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (config_id, application_id) = entry.split_once('=').ok_or_else(|| {
            ConfigError::InvalidApplications(format!(
                "expected 'configId=applicationId', got '{}'",
                entry
            ))
        })?;
        let (config_id, application_id) = (config_id.trim(), application_id.trim());

        if config_id.is_empty() || application_id.is_empty() {
            return Err(ConfigError::InvalidApplications(format!(
                "empty config id or application id in '{}'",
                entry
            )));
        }

        if applications
            .insert(config_id.to_string(), application_id.to_string())
            .is_some()
        {
            return Err(ConfigError::InvalidApplications(format!(
                "duplicate config id '{}'",
                config_id
            )));
        }
    }

    if applications.is_empty() {
        return Err(ConfigError::InvalidApplications(
            "APP_AUTH_APPLICATIONS must name at least one application".to_string(),
        ));
    }

    Ok(applications)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "APP_AUTH_APPLICATIONS".to_string(),
            "jira=jiraWebHookIntegration,zendesk=zendeskApp".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&base_vars()).unwrap();

        assert_eq!(config.applications.len(), 2);
        assert_eq!(
            config.public_cert_cache_seconds,
            DEFAULT_PUBLIC_CERT_CACHE_SECONDS
        );
        assert_eq!(config.http_timeout_seconds, DEFAULT_HTTP_TIMEOUT_SECONDS);
        assert!(config.pod_url.is_none());
    }

    #[test]
    fn test_from_vars_missing_applications() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "APP_AUTH_APPLICATIONS"));
    }

    #[test]
    fn test_from_vars_custom_values() {
        let mut vars = base_vars();
        vars.insert(
            "APP_AUTH_PUBLIC_CERT_CACHE_SECONDS".to_string(),
            "60".to_string(),
        );
        vars.insert(
            "APP_AUTH_POD_URL".to_string(),
            "https://pod.example.com/".to_string(),
        );
        vars.insert("APP_AUTH_HTTP_TIMEOUT_SECONDS".to_string(), "30".to_string());

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(config.public_cert_cache_seconds, 60);
        assert_eq!(config.pod_url.as_deref(), Some("https://pod.example.com"));
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_cache_duration_out_of_range() {
        for bad in ["0", "86401", "-5", "soon"] {
            let mut vars = base_vars();
            vars.insert(
                "APP_AUTH_PUBLIC_CERT_CACHE_SECONDS".to_string(),
                bad.to_string(),
            );
            assert!(
                matches!(
                    Config::from_vars(&vars),
                    Err(ConfigError::InvalidCacheDuration(_))
                ),
                "value {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_cache_duration_bounds_accepted() {
        for good in ["1", "86400"] {
            let mut vars = base_vars();
            vars.insert(
                "APP_AUTH_PUBLIC_CERT_CACHE_SECONDS".to_string(),
                good.to_string(),
            );
            assert!(Config::from_vars(&vars).is_ok());
        }
    }

    #[test]
    fn test_http_timeout_out_of_range() {
        let mut vars = base_vars();
        vars.insert("APP_AUTH_HTTP_TIMEOUT_SECONDS".to_string(), "121".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidHttpTimeout(_))
        ));
    }

    #[test]
    fn test_parse_applications_rejects_malformed() {
        for bad in ["", " , ", "jira", "=app", "jira=", "a=b,a=c"] {
            assert!(
                parse_applications(bad).is_err(),
                "mapping '{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_applications_trims_whitespace() {
        let apps = parse_applications(" jira = jiraApp , zendesk=zdApp ").unwrap();
        assert_eq!(apps.get("jira").map(String::as_str), Some("jiraApp"));
        assert_eq!(apps.get("zendesk").map(String::as_str), Some("zdApp"));
    }

    #[test]
    fn test_application_registry_lookup() {
        let config = Config::from_vars(&base_vars()).unwrap();

        assert_eq!(
            config.get_application_id("jira").unwrap(),
            "jiraWebHookIntegration"
        );
        assert!(matches!(
            config.get_application_id("unknown"),
            Err(AuthError::Bootstrap(_))
        ));
        assert_eq!(
            config.get_public_certificate_cache_duration(),
            Duration::from_secs(DEFAULT_PUBLIC_CERT_CACHE_SECONDS)
        );
    }

    #[test]
    fn test_debug_shows_configuration() {
        let mut vars = base_vars();
        vars.insert(
            "APP_AUTH_POD_URL".to_string(),
            "https://pod.example.com/".to_string(),
        );
        let config = Config::from_vars(&vars).unwrap();

        let debug = format!("{config:?}");
        assert!(debug.starts_with("Config {"));
        assert!(debug.contains("\"jira\": \"jiraWebHookIntegration\""));
        assert!(debug.contains("public_cert_cache_seconds: 3600"));
        assert!(debug.contains("pod_url: Some(\"https://pod.example.com\")"));
        assert!(debug.contains("http_timeout_seconds: 10"));
    }
}
