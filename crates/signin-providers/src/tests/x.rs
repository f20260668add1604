//! X (Twitter) code exchange and user lookup tests.

use super::helpers::*;
use crate::providers::x::{X_TOKEN_URL, X_USER_INFO_URL};
use crate::*;
use serde_json::json;
use std::sync::Arc;

const USERS_ME_URL: &str = "https://api.twitter.com/2/users/me";

async fn x_handler(http: &Arc<MockHttpClient>, credentials: XCredentials) -> Handler {
    test_registry(http)
        .register_handler(ProviderCredentials::X(credentials))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_validate_success() {
    let http = Arc::new(MockHttpClient::new());
    http.respond_json(
        Method::Post,
        X_TOKEN_URL,
        json!({
            "token_type": "bearer",
            "expires_in": 7200,
            "access_token": "x-access-token",
            "scope": "users.read tweet.read offline.access",
            "refresh_token": "x-refresh-token",
        }),
    );
    http.respond_json(
        Method::Get,
        USERS_ME_URL,
        json!({
            "data": {
                "id": "2244994945",
                "name": "Test User",
                "username": "testuser",
                "profile_image_url": "https://pbs.twimg.com/profile_images/1/a_normal.jpg",
            }
        }),
    );
    let handler = x_handler(
        &http,
        x_credentials("x-client", "x-secret").with_code_verifier("pkce-verifier"),
    )
    .await;

    let record = handler.validate_user_credentials("auth-code").await.unwrap();

    assert_eq!(record.provider, ProviderType::X);
    assert_eq!(record.sub, "2244994945");
    assert_eq!(record.name.as_deref(), Some("Test User"));
    assert_eq!(
        record.avatar.as_deref(),
        Some("https://pbs.twimg.com/profile_images/1/a_normal.jpg")
    );
    assert!(record.email.is_none());
    assert_eq!(record.access_token.as_deref(), Some("x-access-token"));
    assert_eq!(record.refresh_token.as_deref(), Some("x-refresh-token"));
    assert_eq!(record.raw["data"]["username"], "testuser");

    let exchange = &http.requests_to(X_TOKEN_URL)[0];
    assert_eq!(
        exchange.header_value("authorization"),
        Some("Basic eC1jbGllbnQ6eC1zZWNyZXQ=")
    );
    assert_eq!(exchange.form_param("code").as_deref(), Some("auth-code"));
    assert_eq!(exchange.form_param("redirect_uri").as_deref(), Some(REDIRECT_URI));
    assert_eq!(exchange.form_param("code_verifier").as_deref(), Some("pkce-verifier"));
    assert!(exchange.form_param("client_secret").is_none());

    let lookup = &http.requests_to(USERS_ME_URL)[0];
    assert_eq!(lookup.url, X_USER_INFO_URL);
    assert_eq!(lookup.header_value("authorization"), Some("Bearer x-access-token"));
}

#[tokio::test]
async fn test_insufficient_scope_skips_user_lookup() {
    let http = Arc::new(MockHttpClient::new());
    http.respond_json(
        Method::Post,
        X_TOKEN_URL,
        json!({
            "token_type": "bearer",
            "access_token": "x-access-token",
            "scope": "tweet.read offline.access",
        }),
    );
    let handler = x_handler(&http, x_credentials("x-client", "x-secret")).await;

    let err = handler
        .validate_user_credentials("auth-code")
        .await
        .unwrap_err();

    match err.kind() {
        ProviderError::InsufficientScope { missing, granted } => {
            assert_eq!(missing, &vec!["users.read".to_string()]);
            assert_eq!(granted, "tweet.read offline.access");
        }
        other => panic!("Expected InsufficientScope, got: {:?}", other),
    }
    assert!(http.requests_to(USERS_ME_URL).is_empty());
}

#[tokio::test]
async fn test_token_endpoint_rejection() {
    let http = Arc::new(MockHttpClient::new());
    http.respond(
        Method::Post,
        X_TOKEN_URL,
        401,
        r#"{"error":"unauthorized_client"}"#,
    );
    let handler = x_handler(&http, x_credentials("x-client", "x-secret")).await;

    let err = handler
        .validate_user_credentials("auth-code")
        .await
        .unwrap_err();

    assert_eq!(err.provider, ProviderType::X);
    assert!(matches!(
        err.kind(),
        ProviderError::Exchange {
            status: Some(401),
            ..
        }
    ));
    assert!(http.requests_to(USERS_ME_URL).is_empty());
}

#[tokio::test]
async fn test_user_lookup_rejection() {
    let http = Arc::new(MockHttpClient::new());
    http.respond_json(
        Method::Post,
        X_TOKEN_URL,
        json!({"access_token": "x-access-token", "scope": "users.read tweet.read"}),
    );
    http.respond(Method::Get, USERS_ME_URL, 429, "Too Many Requests");
    let handler = x_handler(&http, x_credentials("x-client", "x-secret")).await;

    let err = handler
        .validate_user_credentials("auth-code")
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind(),
        ProviderError::UserInfo {
            status: Some(429),
            ..
        }
    ));
}
