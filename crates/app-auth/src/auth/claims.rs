//! Wire claims of pod-issued user JWTs.
//!
//! The `sub` field is redacted in Debug output to prevent exposure in logs.

use crate::models::{optional_string_or_number, JwtPayload};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Claims as they appear in a pod user token.
#[derive(Clone, Deserialize)]
pub struct AppClaims {
    /// Subject (pod user id) - redacted in Debug output.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub sub: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Audience; the application id the token was issued for.
    #[serde(default, deserialize_with = "single_audience")]
    pub aud: Option<String>,

    /// Issuer; the company name of the pod.
    #[serde(default)]
    pub iss: Option<String>,

    /// Every other claim, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl fmt::Debug for AppClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppClaims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("aud", &self.aud)
            .field("iss", &self.iss)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<AppClaims> for JwtPayload {
    fn from(claims: AppClaims) -> Self {
        JwtPayload::new(claims.aud, claims.iss, claims.sub, claims.exp, claims.extra)
    }
}

// RFC 7519 allows `aud` to be a string or an array; pods send a string.
fn single_audience<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Audience {
        One(String),
        Many(Vec<String>),
    }

    Ok(
        match Option::<Audience>::deserialize(deserializer)? {
            Some(Audience::One(aud)) => Some(aud),
            Some(Audience::Many(auds)) => auds.into_iter().next(),
            None => None,
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims: AppClaims = serde_json::from_value(json!({
            "sub": "secret-user-id",
            "exp": 1_900_000_000_i64,
        }))
        .unwrap();

        let debug_str = format!("{:?}", claims);

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("secret-user-id"));
    }

    #[test]
    fn test_claims_split_registered_and_extra() {
        let claims: AppClaims = serde_json::from_value(json!({
            "sub": "12345",
            "exp": 1_900_000_000_i64,
            "aud": "jiraApp",
            "iss": "Acme",
            "emailAddress": "user@example.com",
            "username": "user"
        }))
        .unwrap();

        assert_eq!(claims.sub.as_deref(), Some("12345"));
        assert_eq!(claims.aud.as_deref(), Some("jiraApp"));
        assert_eq!(claims.iss.as_deref(), Some("Acme"));
        assert_eq!(claims.extra.len(), 2);
        assert_eq!(
            claims.extra.get("emailAddress"),
            Some(&json!("user@example.com"))
        );
        assert!(!claims.extra.contains_key("exp"));
    }

    #[test]
    fn test_claims_numeric_sub_and_array_audience() {
        let claims: AppClaims = serde_json::from_value(json!({
            "sub": 12345,
            "exp": 1_900_000_000_i64,
            "aud": ["first", "second"]
        }))
        .unwrap();

        assert_eq!(claims.sub.as_deref(), Some("12345"));
        assert_eq!(claims.aud.as_deref(), Some("first"));
    }

    #[test]
    fn test_claims_require_exp() {
        let result: Result<AppClaims, _> = serde_json::from_value(json!({"sub": "1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_into_payload() {
        let claims: AppClaims = serde_json::from_value(json!({
            "sub": "42",
            "exp": 1_900_000_000_i64,
            "iss": "Acme",
            "locale": "en"
        }))
        .unwrap();

        let payload = JwtPayload::from(claims);

        assert_eq!(payload.user_id(), Some("42"));
        assert_eq!(payload.company_name(), Some("Acme"));
        assert_eq!(payload.application_id(), None);
        assert_eq!(payload.expiration_epoch_seconds(), 1_900_000_000);
        assert_eq!(payload.extra_claims().get("locale"), Some(&json!("en")));
    }
}
