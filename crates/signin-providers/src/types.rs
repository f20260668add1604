//! Core types for sign-in validation.

use crate::errors::RegistryError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Sign in with Apple
    Apple,
    /// Google Identity
    Google,
    /// X (Twitter)
    X,
    /// LinkedIn (OpenID Connect)
    LinkedIn,
    /// SnapChat Login Kit
    SnapChat,
}

impl ProviderType {
    /// Every supported provider
    pub const ALL: [ProviderType; 5] = [
        ProviderType::Apple,
        ProviderType::Google,
        ProviderType::X,
        ProviderType::LinkedIn,
        ProviderType::SnapChat,
    ];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Apple => "apple",
            ProviderType::Google => "google",
            ProviderType::X => "x",
            ProviderType::LinkedIn => "linkedin",
            ProviderType::SnapChat => "snapchat",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apple" => Ok(ProviderType::Apple),
            "google" => Ok(ProviderType::Google),
            "x" | "twitter" => Ok(ProviderType::X),
            "linkedin" => Ok(ProviderType::LinkedIn),
            "snapchat" => Ok(ProviderType::SnapChat),
            other => Err(RegistryError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Tokens returned by a provider's token endpoint
///
/// Lives only for the duration of one validation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangedTokenSet {
    /// Access token from the provider
    pub access_token: String,
    /// Token type (typically "Bearer")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Optional refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token expiry time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Optional OIDC identity token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Granted scope string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl ExchangedTokenSet {
    /// Granted scopes, split on whitespace or commas
    pub fn granted_scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Validated, provider-agnostic user data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedUserRecord {
    /// Provider that asserted the identity
    pub provider: ProviderType,
    /// Stable subject identifier at the provider
    pub sub: String,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Email verified flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar / profile picture URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Provider access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Provider refresh token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Raw provider payload (identity-token claims or user info body)
    pub raw: serde_json::Value,
}

impl NormalizedUserRecord {
    /// Create a record carrying only the subject and raw payload
    pub fn new(provider: ProviderType, sub: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            provider,
            sub: sub.into(),
            email: None,
            email_verified: None,
            name: None,
            avatar: None,
            access_token: None,
            refresh_token: None,
            raw,
        }
    }

    pub(crate) fn with_email(mut self, email: Option<String>, verified: Option<bool>) -> Self {
        self.email = email;
        self.email_verified = verified;
        self
    }

    pub(crate) fn with_profile(mut self, name: Option<String>, avatar: Option<String>) -> Self {
        self.name = name;
        self.avatar = avatar;
        self
    }

    pub(crate) fn with_tokens(mut self, tokens: &ExchangedTokenSet) -> Self {
        self.access_token = Some(tokens.access_token.clone());
        self.refresh_token = tokens.refresh_token.clone();
        self
    }
}

/// JSON Web Key Set published by a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwksKeySet {
    /// Array of JWK keys
    pub keys: Vec<JwksKey>,
}

impl JwksKeySet {
    /// Find key by Key ID (kid)
    pub fn find_key(&self, kid: &str) -> Option<&JwksKey> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

/// Individual JSON Web Key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwksKey {
    /// Key type (e.g., "RSA")
    pub kty: String,
    /// Key ID
    pub kid: Option<String>,
    /// Key use (e.g., "sig" for signature)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    /// Algorithm (e.g., "RS256")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus (base64url encoded)
    pub n: String,
    /// RSA public exponent (base64url encoded)
    pub e: String,
}

/// Get current timestamp
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Accepts `true`, `false`, `"true"` and `"false"`.
///
/// Apple sends verification flags as strings in some token versions.
pub(crate) fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    Ok(
        match Option::<BoolOrString>::deserialize(deserializer)? {
            Some(BoolOrString::Bool(b)) => Some(b),
            Some(BoolOrString::Str(s)) => Some(s.eq_ignore_ascii_case("true")),
            None => None,
        },
    )
}
