//! X (Twitter) OAuth 2.0 validator.
//!
//! Note: X does not support OIDC. Identity is obtained via their REST API
//! after the code exchange, and only when the grant carries the scopes that
//! endpoint needs.

use crate::config::XCredentials;
use crate::errors::{ProviderError, ProviderResult, Result};
use crate::providers::exchange::{exchange_code, fetch_user_info, require_scopes, ClientAuth};
use crate::providers::reject;
use crate::traits::{CredentialValidator, HttpClient};
use crate::types::{NormalizedUserRecord, ProviderType};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Token endpoint
pub const X_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
/// Authenticated user endpoint
pub const X_USER_INFO_URL: &str =
    "https://api.twitter.com/2/users/me?user.fields=profile_image_url";
/// Scopes the grant must include
pub const X_REQUIRED_SCOPES: [&str; 2] = ["users.read", "tweet.read"];

#[derive(Debug, Deserialize)]
struct XUserResponse {
    data: XUser,
}

#[derive(Debug, Deserialize)]
struct XUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    profile_image_url: Option<String>,
}

/// Validator for one X client ID
pub struct XValidator {
    credentials: XCredentials,
    http_client: Arc<dyn HttpClient>,
}

impl XValidator {
    /// Create a validator
    pub fn new(credentials: XCredentials, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            credentials,
            http_client,
        }
    }

    async fn validate(&self, code: &str) -> ProviderResult<NormalizedUserRecord> {
        let mut params = vec![
            ("code", code),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ];
        if let Some(code_verifier) = self.credentials.code_verifier.as_deref() {
            params.push(("code_verifier", code_verifier));
        }

        let tokens = exchange_code(
            self.http_client.as_ref(),
            X_TOKEN_URL,
            ClientAuth::Basic {
                client_id: &self.credentials.client_id,
                client_secret: &self.credentials.client_secret,
            },
            &params,
        )
        .await?;

        require_scopes(&tokens, &X_REQUIRED_SCOPES)?;

        let raw = fetch_user_info(
            self.http_client.as_ref(),
            X_USER_INFO_URL,
            &tokens.access_token,
        )
        .await?;

        let user: XUserResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::InvalidResponse(format!("Malformed user info: {}", e)))?;

        if user.data.id.is_empty() {
            return Err(ProviderError::ClaimValidation("Missing user id".to_string()));
        }

        Ok(NormalizedUserRecord::new(ProviderType::X, user.data.id, raw)
            .with_profile(user.data.name, user.data.profile_image_url)
            .with_tokens(&tokens))
    }
}

#[async_trait]
impl CredentialValidator for XValidator {
    fn provider(&self) -> ProviderType {
        ProviderType::X
    }

    fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    async fn validate_user_credentials(&self, artifact: &str) -> Result<NormalizedUserRecord> {
        self.validate(artifact)
            .await
            .map_err(|e| reject(ProviderType::X, &self.credentials.client_id, e))
    }
}

impl std::fmt::Debug for XValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XValidator")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
