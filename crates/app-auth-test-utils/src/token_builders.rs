//! Builder patterns for test data construction
//!
//! Provides a fluent API for pod-style user tokens and bearer headers.

use crate::crypto_fixtures::{FixtureError, TestKeyPair};
use crate::test_ids::{TEST_AUDIENCE, TEST_ISSUER, TEST_USER_ID};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{json, Map, Value};

/// Builder for signed test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user(42)
///     .expires_in(3600)
///     .sign_with(&primary_key_pair())?;
/// ```
pub struct TestTokenBuilder {
    sub: Option<String>,
    aud: Option<String>,
    iss: Option<String>,
    exp: i64,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults (valid for one hour)
    pub fn new() -> Self {
        Self {
            sub: Some(TEST_USER_ID.to_string()),
            aud: Some(TEST_AUDIENCE.to_string()),
            iss: Some(TEST_ISSUER.to_string()),
            exp: (Utc::now() + Duration::seconds(3600)).timestamp(),
            extra: Map::new(),
        }
    }

    /// Set a numeric subject
    pub fn for_user(mut self, user_id: i64) -> Self {
        self.sub = Some(user_id.to_string());
        self
    }

    /// Set an arbitrary subject string
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Omit the subject claim entirely
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    /// Set the audience (application identity)
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Some(audience.to_string());
        self
    }

    /// Set the issuer (company name)
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set the absolute expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Add a non-registered claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> Value {
        let mut claims = self.extra.clone();
        claims.insert("exp".to_string(), json!(self.exp));
        if let Some(sub) = &self.sub {
            claims.insert("sub".to_string(), json!(sub));
        }
        if let Some(aud) = &self.aud {
            claims.insert("aud".to_string(), json!(aud));
        }
        if let Some(iss) = &self.iss {
            claims.insert("iss".to_string(), json!(iss));
        }
        Value::Object(claims)
    }

    /// Sign the claims with RS512
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::Crypto` if signing fails.
    pub fn sign_with(&self, key_pair: &TestKeyPair) -> Result<String, FixtureError> {
        self.sign_with_algorithm(key_pair, Algorithm::RS512)
    }

    /// Sign the claims with an explicit RSA algorithm
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::Crypto` if signing fails.
    pub fn sign_with_algorithm(
        &self,
        key_pair: &TestKeyPair,
        algorithm: Algorithm,
    ) -> Result<String, FixtureError> {
        let key = key_pair.encoding_key()?;
        encode(&Header::new(algorithm), &self.build(), &key)
            .map_err(|e| FixtureError::Crypto(format!("JWT signing failed: {e}")))
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a token as an Authorization header value
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
