//! Pod API integration tests.
//!
//! Wires the orchestrator to a real `PodApiClient` and an environment-shaped
//! `Config`, with the pod played by a wiremock server.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use app_auth::config::Config;
use app_auth::services::mock::{FixedTokenGenerator, MockIntegrationResolver, MockSessionAuthority};
use app_auth::services::pod_client::SESSION_TOKEN_HEADER;
use app_auth::services::PodApiClient;
use app_auth::{AuthDependencies, AuthError, AuthenticationOrchestrator};
use app_auth_test_utils::*;
use common::secret::ExposeSecret;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn orchestrator_for(server: &MockServer) -> Result<AuthenticationOrchestrator> {
    let vars = HashMap::from([
        (
            "APP_AUTH_APPLICATIONS".to_string(),
            format!("{}={}", TEST_CONFIG_ID, TEST_APP_ID),
        ),
        (
            "APP_AUTH_PUBLIC_CERT_CACHE_SECONDS".to_string(),
            TEST_CERT_CACHE_SECONDS.to_string(),
        ),
        ("APP_AUTH_POD_URL".to_string(), server.uri()),
    ]);
    let config = Config::from_vars(&vars)?;
    let client = Arc::new(PodApiClient::from_config(&config)?);

    Ok(AuthenticationOrchestrator::new(AuthDependencies {
        integration_resolver: Arc::new(MockIntegrationResolver::with_integration(
            TEST_CONFIG_ID,
            TEST_INTEGRATION_TYPE,
        )),
        application_registry: Arc::new(config),
        session_authority: Arc::new(MockSessionAuthority::with_token(TEST_SESSION_TOKEN)),
        certificate_provider: client.clone(),
        auth_handshake: client.clone(),
        session_validator: client.clone(),
        pod_info_provider: client,
        token_generator: Arc::new(FixedTokenGenerator::new(TEST_APP_TOKEN)),
    }))
}

async fn mount_certificate(server: &MockServer, certificate_pem: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/app/{}/certificate", TEST_APP_ID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "certificate": certificate_pem })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_handshake(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/authenticate/extension-app"))
        .and(body_json(json!({
            "applicationId": TEST_APP_ID,
            "appToken": TEST_APP_TOKEN
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appId": TEST_CONFIG_ID,
            "appToken": TEST_APP_TOKEN,
            "symphonyToken": TEST_SYMPHONY_TOKEN
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_user_token_validated_against_pod_certificate() -> Result<()> {
    let server = MockServer::start().await;
    mount_certificate(&server, primary_key_pair().certificate_pem, 1).await;
    let orchestrator = orchestrator_for(&server)?;

    let header_value = bearer(
        &TestTokenBuilder::new()
            .for_user(TEST_USER_ID)
            .sign_with(&primary_key_pair())?,
    );

    for _ in 0..3 {
        let user_id = orchestrator
            .get_user_id_from_authorization_header(TEST_CONFIG_ID, Some(header_value.as_str()))
            .await?;
        assert_eq!(user_id, TEST_USER_ID);
    }

    let forged = bearer(&TestTokenBuilder::new().sign_with(&rogue_key_pair())?);
    assert!(orchestrator
        .get_jwt_token(TEST_CONFIG_ID, Some(forged.as_str()))
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn test_certificate_endpoint_failure_is_not_cached() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/app/{}/certificate", TEST_APP_ID)))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    let orchestrator = orchestrator_for(&server)?;
    let header_value = bearer(&TestTokenBuilder::new().sign_with(&primary_key_pair())?);

    for _ in 0..2 {
        let err = orchestrator
            .get_jwt_token(TEST_CONFIG_ID, Some(header_value.as_str()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::certificate_load(
                TEST_CONFIG_ID,
                AuthError::Remote("Pod API returned status 503".to_string())
            )
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_authenticate_and_confirm_token_pair() -> Result<()> {
    let presented = "issuedEarlierAppToken";
    let server = MockServer::start().await;
    // Only freshly minted tokens may reach the handshake.
    mount_handshake(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/v1/authenticate/extension-app"))
        .and(body_json(json!({
            "applicationId": TEST_APP_ID,
            "appToken": presented
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/configuration/{}/auth/token/{}",
            TEST_CONFIG_ID, presented
        )))
        .and(header(SESSION_TOKEN_HEADER, TEST_SESSION_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appId": TEST_CONFIG_ID,
            "appToken": presented,
            "symphonyToken": TEST_SYMPHONY_TOKEN
        })))
        .expect(1)
        .mount(&server)
        .await;
    let orchestrator = orchestrator_for(&server)?;

    let app_token = orchestrator.authenticate(TEST_CONFIG_ID).await?;
    assert_eq!(app_token.expose_secret(), TEST_APP_TOKEN);

    assert!(
        orchestrator
            .is_valid_token_pair(TEST_CONFIG_ID, presented, TEST_SYMPHONY_TOKEN)
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn test_token_pair_unknown_to_pod_is_false() -> Result<()> {
    let server = MockServer::start().await;
    mount_handshake(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/configuration/{}/auth/token/{}",
            TEST_CONFIG_ID, TEST_APP_TOKEN
        )))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let orchestrator = orchestrator_for(&server)?;

    assert!(
        !orchestrator
            .is_valid_token_pair(TEST_CONFIG_ID, TEST_APP_TOKEN, TEST_SYMPHONY_TOKEN)
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn test_rejected_handshake_propagates() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/authenticate/extension-app"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let orchestrator = orchestrator_for(&server)?;

    assert_eq!(
        orchestrator.authenticate(TEST_CONFIG_ID).await.unwrap_err(),
        AuthError::Remote("Pod API returned status 401".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_pod_identity_fetched_once() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webcontroller/public/podInfo"))
        .and(header(SESSION_TOKEN_HEADER, TEST_SESSION_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "podId": 111, "externalPodId": 111 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let orchestrator = orchestrator_for(&server)?;

    assert!(!orchestrator.check_pod_info(TEST_CONFIG_ID, None).await?);
    assert!(
        orchestrator
            .check_pod_info(TEST_CONFIG_ID, Some(TEST_POD_ID))
            .await?
    );
    assert!(
        !orchestrator
            .check_pod_info(TEST_CONFIG_ID, Some(TEST_INVALID_POD_ID))
            .await?
    );
    Ok(())
}
