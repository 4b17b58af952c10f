// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the sign-in handshake
//!
//! The backend is mocked with wiremock; wallets are the doubles from
//! `fixtures`.

use std::time::Duration;

use api_client::{ApiError, ErrorKind};
use quay::{AuthPhase, QuayClient, QuayConfig, SiweParams};
use serde_json::json;
use shared_types::SessionToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_partial_json, method, path},
};

use fixtures::*;

async fn client(mock_server: &MockServer) -> QuayClient {
    QuayClient::new(&create_test_config(mock_server.uri())).unwrap()
}

#[tokio::test]
async fn challenge_carries_nonce_and_cookie() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, TEST_NONCE, Some(TEST_COOKIE)).await;

    let client = client(&mock_server).await;
    let challenge = client.auth().request_challenge().await.unwrap();

    assert_eq!(challenge.nonce, "abc123");
    assert_eq!(challenge.session_token, Some(SessionToken::new(TEST_SESSION)));
    assert_eq!(client.phase().await, AuthPhase::ChallengeIssued);
    assert!(client.session().await.is_none());
}

#[tokio::test]
async fn challenge_without_cookie_has_no_session() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, TEST_NONCE, None).await;

    let challenge = client(&mock_server)
        .await
        .auth()
        .request_challenge()
        .await
        .unwrap();

    assert_eq!(challenge.nonce, TEST_NONCE);
    assert!(challenge.session_token.is_none());
}

#[tokio::test]
async fn challenge_with_empty_body_is_invalid_response() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, "", Some(TEST_COOKIE)).await;

    let error = client(&mock_server)
        .await
        .auth()
        .request_challenge()
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::InvalidResponse { .. }));
}

#[tokio::test]
async fn challenge_server_error_is_response_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nonce"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let error = client(&mock_server)
        .await
        .auth()
        .request_challenge()
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Response);
    match error {
        ApiError::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let config = QuayConfig::new("http://127.0.0.1:1").with_site(TEST_DOMAIN, TEST_ORIGIN);
    let client = QuayClient::new(&config).unwrap();

    let error = client.auth().request_challenge().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Network);
    assert_eq!(client.phase().await, AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn sign_in_message_layout() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, TEST_NONCE, Some(TEST_COOKIE)).await;

    // No site configured: the per-call values must be used.
    let client = QuayClient::new(&QuayConfig::new(mock_server.uri())).unwrap();
    let params = SiweParams::new("Sign in", 1, 1).with_site("example.com", "https://example.com");
    let sign_in = client.auth().sign_in("0xABC", &params).await.unwrap();

    let message = sign_in.message;
    assert!(message.starts_with(
        "example.com wants you to sign in with your Ethereum account:\n0xABC\n\nSign in\n\n"
    ));

    let fields = [
        "URI: https://example.com",
        "Version: 1",
        "Chain ID: 1",
        "Nonce: abc123",
        "Issued At: ",
    ];
    let positions: Vec<usize> = fields
        .iter()
        .map(|field| message.find(field).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    assert_eq!(sign_in.session, Some(SessionToken::new(TEST_SESSION)));
}

#[tokio::test]
async fn sign_in_without_site_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nonce"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TEST_NONCE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = QuayClient::new(&QuayConfig::new(mock_server.uri())).unwrap();
    let error = client
        .auth()
        .sign_in("0xABC", &test_params())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Precondition);
}

#[tokio::test]
async fn verify_binds_session() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, TEST_NONCE, Some(TEST_COOKIE)).await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .and(body_partial_json(json!({
            "session": TEST_SESSION,
            "signature": format!("0x{}", "ab".repeat(65)),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server).await;
    let outcome = client
        .verify(&StaticSigner::default(), &test_params())
        .await
        .unwrap();

    assert_eq!(outcome.response, json!({"ok": true}));
    assert_eq!(outcome.session, Some(SessionToken::new(TEST_SESSION)));
    assert_eq!(client.session().await, Some(SessionToken::new(TEST_SESSION)));
    assert_eq!(client.phase().await, AuthPhase::Verified);
    assert!(client.auth().is_authenticated().await);

    let bodies = BackendFixture::bodies(&mock_server, "/verify").await;
    let message = bodies[0]["message"].as_str().unwrap();
    assert!(message.contains(&test_signer_address().to_checksum(None)));
    assert!(message.contains("Nonce: abc123"));
    assert!(message.starts_with("example.com wants you to sign in"));
}

#[tokio::test]
async fn rejected_signature_leaves_session_untouched() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, TEST_NONCE, Some(TEST_COOKIE)).await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri()).with_session("sid=seed");
    let client = QuayClient::new(&config).unwrap();

    let error = client
        .verify(&RejectingSigner, &test_params())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Signer { .. }));
    assert_eq!(error.kind(), ErrorKind::Auth);
    assert_eq!(client.session().await, Some(SessionToken::new("sid=seed")));
    assert_eq!(client.phase().await, AuthPhase::Unauthenticated);
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
async fn falsy_verify_payload_is_authentication_error() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, TEST_NONCE, Some(TEST_COOKIE)).await;
    BackendFixture::mount_verify(&mock_server, 200, json!({"verified": false})).await;

    let client = client(&mock_server).await;
    let error = client
        .verify(&StaticSigner::default(), &test_params())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Authentication { .. }));
    assert!(client.session().await.is_none());
    assert_eq!(client.phase().await, AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn refused_verify_is_authentication_error() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce(&mock_server, TEST_NONCE, Some(TEST_COOKIE)).await;
    BackendFixture::mount_verify(&mock_server, 401, json!({"error": "bad signature"})).await;

    let client = client(&mock_server).await;
    let error = client
        .verify(&StaticSigner::default(), &test_params())
        .await
        .unwrap_err();

    assert!(error.is_auth());
    assert!(client.session().await.is_none());
}

#[tokio::test]
async fn retry_after_failure_keeps_second_session() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce_once(&mock_server, "first", "sid=first; Path=/").await;
    BackendFixture::mount_nonce_once(&mock_server, "second", "sid=second; Path=/").await;
    BackendFixture::mount_verify(&mock_server, 200, json!({"ok": true})).await;

    let client = client(&mock_server).await;

    client
        .verify(&RejectingSigner, &test_params())
        .await
        .unwrap_err();
    assert!(client.session().await.is_none());

    let outcome = client
        .verify(&StaticSigner::default(), &test_params())
        .await
        .unwrap();

    assert_eq!(outcome.session, Some(SessionToken::new("sid=second")));
    assert_eq!(client.session().await, Some(SessionToken::new("sid=second")));
    assert_eq!(client.phase().await, AuthPhase::Verified);
}

#[tokio::test]
async fn failed_reauthentication_keeps_previous_session() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce_once(&mock_server, "first", "sid=first; Path=/").await;
    BackendFixture::mount_nonce_once(&mock_server, "second", "sid=second; Path=/").await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    BackendFixture::mount_verify(&mock_server, 403, json!({"error": "expired"})).await;

    let client = client(&mock_server).await;
    client
        .verify(&StaticSigner::default(), &test_params())
        .await
        .unwrap();

    let error = client
        .verify(&StaticSigner::default(), &test_params())
        .await
        .unwrap_err();

    assert!(error.is_auth());
    assert_eq!(client.session().await, Some(SessionToken::new("sid=first")));
    assert_eq!(client.phase().await, AuthPhase::Verified);
    assert!(client.auth().is_authenticated().await);
}

#[tokio::test]
async fn concurrent_verifies_run_one_at_a_time() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_happy_path(&mock_server).await;

    let client = client(&mock_server).await;
    let signer = OverlapSigner::new(Duration::from_millis(200));
    let params = test_params();

    let (first, second) = tokio::join!(
        client.verify(&signer, &params),
        client.verify(&signer, &params)
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(signer.signed(), 2);
    assert_eq!(signer.peak(), 1);
    assert_eq!(BackendFixture::bodies(&mock_server, "/verify").await.len(), 2);
    assert_eq!(client.session().await, Some(SessionToken::new(TEST_SESSION)));
}

#[tokio::test]
async fn standalone_challenge_keeps_verified_phase() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_nonce_once(&mock_server, "first", "sid=first; Path=/").await;
    BackendFixture::mount_nonce_once(&mock_server, "second", "sid=second; Path=/").await;
    BackendFixture::mount_verify(&mock_server, 200, json!({"ok": true})).await;

    let client = client(&mock_server).await;
    client
        .verify(&StaticSigner::default(), &test_params())
        .await
        .unwrap();

    let challenge = client.auth().request_challenge().await.unwrap();

    assert_eq!(challenge.session_token, Some(SessionToken::new("sid=second")));
    assert_eq!(client.phase().await, AuthPhase::Verified);
    assert!(client.auth().is_authenticated().await);
    assert_eq!(client.session().await, Some(SessionToken::new("sid=first")));
}

#[tokio::test]
async fn known_session_is_verified() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .and(body_json(json!({"session": TEST_SESSION})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"address": "0x5a5a", "verified": true})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let status = client(&mock_server)
        .await
        .is_verified(&SessionToken::new(TEST_SESSION))
        .await
        .unwrap();

    assert!(status.verified);
    assert_eq!(status.payload["address"], "0x5a5a");
}

#[tokio::test]
async fn refused_session_is_unverified() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_authenticate(&mock_server, 401, json!({"error": "unknown session"})).await;

    let status = client(&mock_server)
        .await
        .is_verified(&SessionToken::new("sid=unknown"))
        .await
        .unwrap();

    assert!(!status.verified);
}

#[tokio::test]
async fn false_payload_is_unverified() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_authenticate(&mock_server, 200, json!(false)).await;

    let status = client(&mock_server)
        .await
        .is_verified(&SessionToken::new("sid=unknown"))
        .await
        .unwrap();

    assert!(!status.verified);
    assert_eq!(status.payload, json!(false));
}

#[tokio::test]
async fn authenticate_server_error_propagates() {
    let mock_server = MockServer::start().await;
    BackendFixture::mount_authenticate(&mock_server, 502, json!({"error": "bad gateway"})).await;

    let error = client(&mock_server)
        .await
        .is_verified(&SessionToken::new(TEST_SESSION))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Http { status: 502, .. }));
}
