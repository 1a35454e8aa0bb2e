//! Token exchange integration tests using wiremock
//!
//! Verifies the behaviour of `src/auth/exchange.rs`:
//!
//! - The form body carries the grant type, code, credentials and redirect URI.
//! - A successful response is parsed into a `Token` exactly.
//! - Non-success responses surface the raw body in the error.
//! - Malformed JSON surfaces as a `TokenParse` error.

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aps_auth::auth::credentials::Credentials;
use aps_auth::auth::exchange::TokenExchanger;
use aps_auth::{ApsAuthError, Token};

const TOKEN_PATH: &str = "/authentication/v2/token";
const REDIRECT_URI: &str = "http://localhost:8080/api/auth/callback";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn exchanger_for(server: &MockServer) -> TokenExchanger {
    TokenExchanger::new(
        reqwest::Client::new(),
        format!("{}{}", server.uri(), TOKEN_PATH),
        Credentials::new("test-client-id", "test-client-secret"),
    )
}

fn token_response_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "a",
        "token_type": "Bearer",
        "expires_in": 3600,
        "refresh_token": "r"
    })
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_exchange_posts_form_with_code_and_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=ABC123"))
        .and(body_string_contains("client_id=test-client-id"))
        .and(body_string_contains("client_secret=test-client-secret"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fapi%2Fauth%2Fcallback",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body()))
        .expect(1)
        .mount(&server)
        .await;

    let token = exchanger_for(&server)
        .exchange("ABC123", REDIRECT_URI)
        .await
        .expect("exchange must succeed when the body matches");

    assert_eq!(token.access_token, "a");
    server.verify().await;
}

#[tokio::test]
async fn test_exchange_sends_empty_code_without_failing_early() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("code=&"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_request"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = exchanger_for(&server).exchange("", REDIRECT_URI).await;

    assert!(result.is_err(), "empty code must be rejected by the provider");
    server.verify().await;
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_exchange_parses_token_exactly() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"access_token":"a","token_type":"Bearer","expires_in":3600,"refresh_token":"r"}"#,
        ))
        .mount(&server)
        .await;

    let token = exchanger_for(&server)
        .exchange("code", REDIRECT_URI)
        .await
        .unwrap();

    assert_eq!(
        token,
        Token {
            access_token: "a".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: "r".to_string(),
        }
    );
}

#[tokio::test]
async fn test_exchange_error_status_carries_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let err = exchanger_for(&server)
        .exchange("expired-code", REDIRECT_URI)
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("invalid_grant"),
        "error must include the response body, got: {err}"
    );
    match err.downcast_ref::<ApsAuthError>() {
        Some(ApsAuthError::TokenExchange { status, body }) => {
            assert_eq!(*status, 400);
            assert_eq!(body, "invalid_grant");
        }
        other => panic!("expected TokenExchange error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_exchange_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let result = exchanger_for(&server).exchange("code", REDIRECT_URI).await;

    assert!(result.is_err());
    server.verify().await;
}

#[tokio::test]
async fn test_exchange_malformed_json_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = exchanger_for(&server)
        .exchange("code", REDIRECT_URI)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApsAuthError>(),
        Some(ApsAuthError::TokenParse(_))
    ));
}

#[tokio::test]
async fn test_exchange_missing_field_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "a",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let err = exchanger_for(&server)
        .exchange("code", REDIRECT_URI)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApsAuthError>(),
        Some(ApsAuthError::TokenParse(_))
    ));
}

#[tokio::test]
async fn test_exchange_unreachable_endpoint_is_http_error() {
    // Bind then drop to obtain a port nothing is listening on.
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let exchanger = TokenExchanger::new(
        reqwest::Client::new(),
        format!("http://127.0.0.1:{port}{TOKEN_PATH}"),
        Credentials::new("id", "secret"),
    );

    let err = exchanger.exchange("code", REDIRECT_URI).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApsAuthError>(),
        Some(ApsAuthError::Http(_))
    ));
}
