//! LinkedIn OpenID Connect validator.

use crate::config::LinkedInCredentials;
use crate::errors::{ProviderError, ProviderResult, Result};
use crate::oidc::{verify_id_token, IdTokenExpectations, IssuerRule, JwksCache};
use crate::providers::exchange::{exchange_code, require_scopes, ClientAuth};
use crate::providers::reject;
use crate::traits::{CredentialValidator, HttpClient};
use crate::types::{deserialize_flexible_bool, NormalizedUserRecord, ProviderType};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Identity token issuer
pub const LINKEDIN_ISSUER: &str = "https://www.linkedin.com";
/// Token endpoint
pub const LINKEDIN_TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
/// Published signing keys
pub const LINKEDIN_KEYS_URL: &str = "https://www.linkedin.com/oauth/openid/jwks";
/// Scopes the grant must include
pub const LINKEDIN_REQUIRED_SCOPES: [&str; 1] = ["openid"];

#[derive(Debug, Deserialize)]
struct LinkedInIdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Validator for one LinkedIn client ID
pub struct LinkedInValidator {
    credentials: LinkedInCredentials,
    http_client: Arc<dyn HttpClient>,
    keys: Arc<JwksCache>,
}

impl LinkedInValidator {
    /// Create a validator sharing `keys` with other LinkedIn validators
    pub fn new(
        credentials: LinkedInCredentials,
        http_client: Arc<dyn HttpClient>,
        keys: Arc<JwksCache>,
    ) -> Self {
        Self {
            credentials,
            http_client,
            keys,
        }
    }

    /// Create the key cache LinkedIn validators share
    pub fn key_cache(http_client: Arc<dyn HttpClient>) -> JwksCache {
        JwksCache::new(LINKEDIN_KEYS_URL, http_client)
    }

    async fn validate(&self, code: &str) -> ProviderResult<NormalizedUserRecord> {
        let tokens = exchange_code(
            self.http_client.as_ref(),
            LINKEDIN_TOKEN_URL,
            ClientAuth::FormBody {
                client_id: &self.credentials.client_id,
                client_secret: &self.credentials.client_secret,
            },
            &[
                ("code", code),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ],
        )
        .await?;

        require_scopes(&tokens, &LINKEDIN_REQUIRED_SCOPES)?;

        let id_token = tokens.id_token.as_deref().ok_or_else(|| {
            ProviderError::InvalidResponse("Token response did not include an id_token".to_string())
        })?;

        let raw = verify_id_token(
            id_token,
            &self.keys,
            &IdTokenExpectations {
                audience: &self.credentials.client_id,
                issuer: IssuerRule::OneOf(&[LINKEDIN_ISSUER]),
            },
        )
        .await?;

        let claims: LinkedInIdClaims = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::ClaimValidation(format!("Malformed claims: {}", e)))?;

        // email_verified is optional in LinkedIn tokens
        let email_verified = claims.email_verified.unwrap_or(false);

        Ok(NormalizedUserRecord::new(ProviderType::LinkedIn, claims.sub, raw)
            .with_email(claims.email, Some(email_verified))
            .with_profile(claims.name, claims.picture)
            .with_tokens(&tokens))
    }
}

#[async_trait]
impl CredentialValidator for LinkedInValidator {
    fn provider(&self) -> ProviderType {
        ProviderType::LinkedIn
    }

    fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    async fn validate_user_credentials(&self, artifact: &str) -> Result<NormalizedUserRecord> {
        self.validate(artifact)
            .await
            .map_err(|e| reject(ProviderType::LinkedIn, &self.credentials.client_id, e))
    }
}

impl std::fmt::Debug for LinkedInValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedInValidator")
            .field("credentials", &self.credentials)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
