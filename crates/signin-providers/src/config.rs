//! Provider credential configuration.
//!
//! Credentials are immutable once handed to a validator. Secret material is held
//! in [`Zeroizing`] buffers and never printed by `Debug`.

use crate::types::ProviderType;
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "<redacted>";

/// Sign in with Apple credentials
#[derive(Clone)]
pub struct AppleCredentials {
    /// Services ID or bundle ID
    pub client_id: String,
    /// Apple developer team ID (issuer of the client secret)
    pub team_id: String,
    /// Key ID of the signing key registered with Apple
    pub key_id: String,
    /// PKCS#8 PEM encoded P-256 private key
    pub private_key: Zeroizing<String>,
    /// Redirect URI used during authorization, if any
    pub redirect_uri: Option<String>,
}

impl AppleCredentials {
    /// Create Apple credentials
    pub fn new(
        client_id: impl Into<String>,
        team_id: impl Into<String>,
        key_id: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            team_id: team_id.into(),
            key_id: key_id.into(),
            private_key: Zeroizing::new(private_key.into()),
            redirect_uri: None,
        }
    }

    /// Set the redirect URI sent with the code exchange
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }
}

impl fmt::Debug for AppleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleCredentials")
            .field("client_id", &self.client_id)
            .field("team_id", &self.team_id)
            .field("key_id", &self.key_id)
            .field("private_key", &REDACTED)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Google Identity credentials
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    /// OAuth client ID (expected audience of identity tokens)
    pub client_id: String,
}

impl GoogleCredentials {
    /// Create Google credentials
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }
}

/// X (Twitter) OAuth 2.0 credentials
#[derive(Clone)]
pub struct XCredentials {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: Zeroizing<String>,
    /// Redirect URI
    pub redirect_uri: String,
    /// PKCE code verifier matching the challenge sent at authorization
    pub code_verifier: Option<String>,
}

impl XCredentials {
    /// Create X credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Zeroizing::new(client_secret.into()),
            redirect_uri: redirect_uri.into(),
            code_verifier: None,
        }
    }

    /// Set the PKCE code verifier
    pub fn with_code_verifier(mut self, code_verifier: impl Into<String>) -> Self {
        self.code_verifier = Some(code_verifier.into());
        self
    }
}

impl fmt::Debug for XCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("redirect_uri", &self.redirect_uri)
            .field("code_verifier", &self.code_verifier.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Client ID, secret and redirect URI for plain code-exchange providers
#[derive(Clone)]
pub struct ClientSecretCredentials {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: Zeroizing<String>,
    /// Redirect URI
    pub redirect_uri: String,
}

impl ClientSecretCredentials {
    /// Create credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Zeroizing::new(client_secret.into()),
            redirect_uri: redirect_uri.into(),
        }
    }
}

impl fmt::Debug for ClientSecretCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// LinkedIn OpenID Connect credentials
pub type LinkedInCredentials = ClientSecretCredentials;

/// SnapChat Login Kit credentials
pub type SnapChatCredentials = ClientSecretCredentials;

/// Credentials for one provider tenant
#[derive(Debug, Clone)]
pub enum ProviderCredentials {
    /// Sign in with Apple
    Apple(AppleCredentials),
    /// Google Identity
    Google(GoogleCredentials),
    /// X (Twitter)
    X(XCredentials),
    /// LinkedIn
    LinkedIn(LinkedInCredentials),
    /// SnapChat
    SnapChat(SnapChatCredentials),
}

impl ProviderCredentials {
    /// Provider these credentials belong to
    pub fn provider(&self) -> ProviderType {
        match self {
            ProviderCredentials::Apple(_) => ProviderType::Apple,
            ProviderCredentials::Google(_) => ProviderType::Google,
            ProviderCredentials::X(_) => ProviderType::X,
            ProviderCredentials::LinkedIn(_) => ProviderType::LinkedIn,
            ProviderCredentials::SnapChat(_) => ProviderType::SnapChat,
        }
    }

    /// Client identifier keying the handler registry
    pub fn client_id(&self) -> &str {
        match self {
            ProviderCredentials::Apple(c) => &c.client_id,
            ProviderCredentials::Google(c) => &c.client_id,
            ProviderCredentials::X(c) => &c.client_id,
            ProviderCredentials::LinkedIn(c) | ProviderCredentials::SnapChat(c) => &c.client_id,
        }
    }
}
