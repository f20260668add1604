//! Sign in with Apple validator.
//!
//! Apple authenticates the client with a short-lived ES256 assertion (the
//! client secret) signed by the developer's private key. The secret is valid
//! for 30 days and must be regenerated before it expires; the host drives that
//! through [`crate::HandlerRegistry::rotate_apple_secrets`].
//!
//! Identity tokens are verified against Apple's published keys, held in a
//! [`JwksCache`] shared by every Apple validator.

use crate::config::AppleCredentials;
use crate::errors::{ProviderError, ProviderResult, Result, SignInError};
use crate::oidc::{verify_id_token, IdTokenExpectations, IssuerRule, JwksCache};
use crate::providers::exchange::{exchange_code, ClientAuth};
use crate::providers::reject;
use crate::traits::{CredentialValidator, HttpClient};
use crate::types::{
    current_timestamp, deserialize_flexible_bool, JwksKey, NormalizedUserRecord, ProviderType,
};
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use zeroize::Zeroizing;

/// Apple identity token issuer and client secret audience
pub const APPLE_ISSUER: &str = "https://appleid.apple.com";
/// Token endpoint
pub const APPLE_TOKEN_URL: &str = "https://appleid.apple.com/auth/token";
/// Published signing keys
pub const APPLE_KEYS_URL: &str = "https://appleid.apple.com/auth/keys";
/// Client secret validity (30 days)
pub const CLIENT_SECRET_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Claims of the client secret assertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSecretClaims {
    /// Team ID
    pub iss: String,
    /// Client ID
    pub sub: String,
    /// Apple issuer
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

#[derive(Debug, Deserialize)]
struct AppleIdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    email_verified: Option<bool>,
}

/// Validator for one Apple client ID
pub struct AppleValidator {
    credentials: AppleCredentials,
    http_client: Arc<dyn HttpClient>,
    keys: Arc<JwksCache>,
    client_secret: RwLock<Option<Zeroizing<String>>>,
}

impl AppleValidator {
    /// Create a validator sharing `keys` with other Apple validators
    ///
    /// The validator cannot exchange codes until [`Self::initialize`] or
    /// [`Self::generate_client_secret`] has run.
    pub fn new(
        credentials: AppleCredentials,
        http_client: Arc<dyn HttpClient>,
        keys: Arc<JwksCache>,
    ) -> Self {
        Self {
            credentials,
            http_client,
            keys,
            client_secret: RwLock::new(None),
        }
    }

    /// Create the key cache Apple validators share
    pub fn key_cache(http_client: Arc<dyn HttpClient>) -> JwksCache {
        JwksCache::new(APPLE_KEYS_URL, http_client)
    }

    /// Fetch Apple's public keys and generate the first client secret
    pub async fn initialize(&self) -> Result<()> {
        self.refresh_public_keys().await?;
        self.generate_client_secret().await?;
        Ok(())
    }

    /// Shared key cache
    pub fn keys(&self) -> &Arc<JwksCache> {
        &self.keys
    }

    /// Refresh Apple's public keys, replacing the shared cache on success
    pub async fn refresh_public_keys(&self) -> Result<usize> {
        self.keys
            .refresh_public_keys()
            .await
            .map_err(|e| SignInError::new(ProviderType::Apple, e))
    }

    /// Cached public key for `kid`, refreshing once on a miss
    pub async fn get_public_key(&self, kid: &str) -> Result<JwksKey> {
        self.keys
            .get_public_key(kid)
            .await
            .map_err(|e| SignInError::new(ProviderType::Apple, e))
    }

    /// Sign a new client secret and store it on this validator
    pub async fn generate_client_secret(&self) -> Result<String> {
        let secret = self
            .sign_client_secret(current_timestamp())
            .map_err(|e| SignInError::new(ProviderType::Apple, e))?;

        *self.client_secret.write().await = Some(Zeroizing::new(secret.clone()));
        info!(client_id = %self.credentials.client_id, "Generated Apple client secret");

        Ok(secret)
    }

    /// Current client secret
    pub async fn client_secret(&self) -> Result<String> {
        self.current_client_secret()
            .await
            .map_err(|e| SignInError::new(ProviderType::Apple, e))
    }

    fn sign_client_secret(&self, now: u64) -> ProviderResult<String> {
        let claims = ClientSecretClaims {
            iss: self.credentials.team_id.clone(),
            sub: self.credentials.client_id.clone(),
            aud: APPLE_ISSUER.to_string(),
            iat: now,
            exp: now + CLIENT_SECRET_TTL_SECS,
        };

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.credentials.key_id.clone());

        let key = EncodingKey::from_ec_pem(self.credentials.private_key.as_bytes()).map_err(|e| {
            ProviderError::Configuration(format!("Invalid Apple private key: {}", e))
        })?;

        encode(&header, &claims, &key).map_err(|e| {
            ProviderError::Configuration(format!("Failed to sign client secret: {}", e))
        })
    }

    async fn current_client_secret(&self) -> ProviderResult<String> {
        self.client_secret
            .read()
            .await
            .as_ref()
            .map(|s| s.as_str().to_owned())
            .ok_or(ProviderError::NotInitialized("Apple client secret"))
    }

    async fn validate(&self, code: &str) -> ProviderResult<NormalizedUserRecord> {
        let client_secret = Zeroizing::new(self.current_client_secret().await?);

        let mut params = vec![("code", code)];
        if let Some(redirect_uri) = self.credentials.redirect_uri.as_deref() {
            params.push(("redirect_uri", redirect_uri));
        }

        let tokens = exchange_code(
            self.http_client.as_ref(),
            APPLE_TOKEN_URL,
            ClientAuth::FormBody {
                client_id: &self.credentials.client_id,
                client_secret: &client_secret,
            },
            &params,
        )
        .await?;

        let id_token = tokens.id_token.as_deref().ok_or_else(|| {
            ProviderError::InvalidResponse("Token response did not include an id_token".to_string())
        })?;

        let raw = verify_id_token(
            id_token,
            &self.keys,
            &IdTokenExpectations {
                audience: &self.credentials.client_id,
                issuer: IssuerRule::Contains(APPLE_ISSUER),
            },
        )
        .await?;

        let claims: AppleIdClaims = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::ClaimValidation(format!("Malformed claims: {}", e)))?;

        Ok(NormalizedUserRecord::new(ProviderType::Apple, claims.sub, raw)
            .with_email(claims.email, claims.email_verified)
            .with_tokens(&tokens))
    }
}

#[async_trait]
impl CredentialValidator for AppleValidator {
    fn provider(&self) -> ProviderType {
        ProviderType::Apple
    }

    fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    async fn validate_user_credentials(&self, artifact: &str) -> Result<NormalizedUserRecord> {
        self.validate(artifact)
            .await
            .map_err(|e| reject(ProviderType::Apple, &self.credentials.client_id, e))
    }
}

impl std::fmt::Debug for AppleValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppleValidator")
            .field("credentials", &self.credentials)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
