//! SnapChat Login Kit validator.

use crate::config::SnapChatCredentials;
use crate::errors::{ProviderError, ProviderResult, Result};
use crate::providers::exchange::{exchange_code, fetch_user_info, ClientAuth};
use crate::providers::reject;
use crate::traits::{CredentialValidator, HttpClient};
use crate::types::{NormalizedUserRecord, ProviderType};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Token endpoint
pub const SNAPCHAT_TOKEN_URL: &str = "https://accounts.snapchat.com/accounts/oauth2/token";
/// Login Kit "me" endpoint
pub const SNAPCHAT_USER_INFO_URL: &str = "https://kit.snapchat.com/v1/me";
/// GraphQL selection sent to the "me" endpoint
pub const SNAPCHAT_USER_QUERY: &str = "{me{externalId displayName bitmoji{avatar}}}";

#[derive(Debug, Deserialize)]
struct SnapMeResponse {
    data: SnapMeData,
}

#[derive(Debug, Deserialize)]
struct SnapMeData {
    me: SnapUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapUser {
    #[serde(default)]
    external_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    bitmoji: Option<SnapBitmoji>,
}

#[derive(Debug, Deserialize)]
struct SnapBitmoji {
    #[serde(default)]
    avatar: Option<String>,
}

/// Validator for one SnapChat client ID
pub struct SnapChatValidator {
    credentials: SnapChatCredentials,
    http_client: Arc<dyn HttpClient>,
}

impl SnapChatValidator {
    /// Create a validator
    pub fn new(credentials: SnapChatCredentials, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            credentials,
            http_client,
        }
    }

    fn user_info_url() -> ProviderResult<String> {
        url::Url::parse_with_params(SNAPCHAT_USER_INFO_URL, &[("query", SNAPCHAT_USER_QUERY)])
            .map(String::from)
            .map_err(|e| ProviderError::Configuration(format!("Invalid user info URL: {}", e)))
    }

    async fn validate(&self, code: &str) -> ProviderResult<NormalizedUserRecord> {
        let tokens = exchange_code(
            self.http_client.as_ref(),
            SNAPCHAT_TOKEN_URL,
            ClientAuth::Basic {
                client_id: &self.credentials.client_id,
                client_secret: &self.credentials.client_secret,
            },
            &[
                ("code", code),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ],
        )
        .await?;

        let raw = fetch_user_info(
            self.http_client.as_ref(),
            &Self::user_info_url()?,
            &tokens.access_token,
        )
        .await?;

        let response: SnapMeResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::InvalidResponse(format!("Malformed user info: {}", e)))?;
        let user = response.data.me;

        if user.external_id.is_empty() {
            return Err(ProviderError::ClaimValidation(
                "Missing externalId".to_string(),
            ));
        }

        let avatar = user.bitmoji.and_then(|b| b.avatar);
        Ok(NormalizedUserRecord::new(ProviderType::SnapChat, user.external_id, raw)
            .with_profile(user.display_name, avatar)
            .with_tokens(&tokens))
    }
}

#[async_trait]
impl CredentialValidator for SnapChatValidator {
    fn provider(&self) -> ProviderType {
        ProviderType::SnapChat
    }

    fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    async fn validate_user_credentials(&self, artifact: &str) -> Result<NormalizedUserRecord> {
        self.validate(artifact)
            .await
            .map_err(|e| reject(ProviderType::SnapChat, &self.credentials.client_id, e))
    }
}

impl std::fmt::Debug for SnapChatValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapChatValidator")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
