//! Google identity token validator.
//!
//! Google sign-in hands the client an identity token directly, so there is no
//! code exchange: the token is verified against Google's published keys and
//! must carry a verified email.

use crate::config::GoogleCredentials;
use crate::errors::{ProviderError, ProviderResult, Result, SignInError};
use crate::oidc::{verify_id_token, IdTokenExpectations, IssuerRule, JwksCache};
use crate::providers::reject;
use crate::traits::{CredentialValidator, HttpClient};
use crate::types::{deserialize_flexible_bool, NormalizedUserRecord, ProviderType};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Accepted `iss` values
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
/// Published signing keys
pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

#[derive(Debug, Deserialize)]
struct GoogleIdClaims {
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

/// Validator for one Google client ID
#[derive(Debug)]
pub struct GoogleValidator {
    credentials: GoogleCredentials,
    keys: Arc<JwksCache>,
}

impl GoogleValidator {
    /// Create a validator sharing `keys` with other Google validators
    pub fn new(credentials: GoogleCredentials, keys: Arc<JwksCache>) -> Self {
        Self { credentials, keys }
    }

    /// Create the key cache Google validators share
    pub fn key_cache(http_client: Arc<dyn HttpClient>) -> JwksCache {
        JwksCache::new(GOOGLE_CERTS_URL, http_client)
    }

    /// Check the configuration is usable; performs no network call
    pub async fn initialize(&self) -> Result<()> {
        if self.credentials.client_id.trim().is_empty() {
            return Err(SignInError::new(
                ProviderType::Google,
                ProviderError::Configuration("Google client id is empty".to_string()),
            ));
        }
        Ok(())
    }

    async fn validate(&self, id_token: &str) -> ProviderResult<NormalizedUserRecord> {
        let raw = verify_id_token(
            id_token,
            &self.keys,
            &IdTokenExpectations {
                audience: &self.credentials.client_id,
                issuer: IssuerRule::OneOf(&GOOGLE_ISSUERS),
            },
        )
        .await?;

        let claims: GoogleIdClaims = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::ClaimValidation(format!("Malformed claims: {}", e)))?;

        if claims.email.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::ClaimValidation(
                "Email claim is missing".to_string(),
            ));
        }
        if claims.email_verified != Some(true) {
            return Err(ProviderError::ClaimValidation(
                "Email is not verified".to_string(),
            ));
        }

        Ok(NormalizedUserRecord::new(ProviderType::Google, claims.sub, raw)
            .with_email(claims.email, claims.email_verified)
            .with_profile(claims.name, claims.picture))
    }
}

#[async_trait]
impl CredentialValidator for GoogleValidator {
    fn provider(&self) -> ProviderType {
        ProviderType::Google
    }

    fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    async fn validate_user_credentials(&self, artifact: &str) -> Result<NormalizedUserRecord> {
        self.validate(artifact)
            .await
            .map_err(|e| reject(ProviderType::Google, &self.credentials.client_id, e))
    }
}
