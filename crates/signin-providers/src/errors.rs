//! Sign-in error types.

use crate::http::TransportError;
use crate::types::ProviderType;
use thiserror::Error;

/// Failure raised inside a single provider validation step.
///
/// Validators never surface this type directly; it is carried as the source of
/// a [`SignInError`] naming the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Token endpoint unreachable or returned a non-success status
    #[error("Token exchange failed with status {}: {body}", status_label(.status))]
    Exchange {
        /// HTTP status, `None` when the request never completed
        status: Option<u16>,
        /// Raw response body or transport error message
        body: String,
    },

    /// Granted scope is missing a required entry
    #[error("Insufficient scope: missing {missing:?}, granted {granted:?}")]
    InsufficientScope {
        /// Required scopes absent from the grant
        missing: Vec<String>,
        /// Scope string returned by the provider
        granted: String,
    },

    /// Signing keys could not be fetched
    #[error("Failed to fetch signing keys: {0}")]
    KeyFetch(String),

    /// No signing key matches the token's key id
    #[error("Signing key not found: kid={kid}")]
    KeyNotFound {
        /// Key ID that was not found
        kid: String,
    },

    /// Issuer, audience, subject or verified-email check failed
    #[error("Claim validation failed: {0}")]
    ClaimValidation(String),

    /// Identity token is malformed or its signature does not verify
    #[error("Invalid identity token: {0}")]
    InvalidToken(String),

    /// User info endpoint unreachable or returned a non-success status
    #[error("User info request failed with status {}: {body}", status_label(.status))]
    UserInfo {
        /// HTTP status, `None` when the request never completed
        status: Option<u16>,
        /// Raw response body or transport error message
        body: String,
    },

    /// Provider response could not be parsed
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),

    /// Operation requires initialization that was never performed
    #[error("{0} has not been initialized")]
    NotInitialized(&'static str),

    /// Provider credentials are unusable
    #[error("Invalid provider configuration: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Map a transport failure on the token endpoint
    pub(crate) fn exchange_transport(error: TransportError) -> Self {
        ProviderError::Exchange {
            status: None,
            body: error.to_string(),
        }
    }

    /// Map a transport failure on the user info endpoint
    pub(crate) fn user_info_transport(error: TransportError) -> Self {
        ProviderError::UserInfo {
            status: None,
            body: error.to_string(),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none (transport failure)".to_string(),
    }
}

/// Provider-named sign-in failure returned by every validator
#[derive(Debug, Error)]
#[error("{provider} sign-in failed: {source}")]
pub struct SignInError {
    /// Provider whose validation failed
    pub provider: ProviderType,
    /// Specific failure
    #[source]
    pub source: ProviderError,
}

impl SignInError {
    /// Wrap a provider failure
    pub fn new(provider: ProviderType, source: ProviderError) -> Self {
        Self { provider, source }
    }

    /// Specific failure kind
    pub fn kind(&self) -> &ProviderError {
        &self.source
    }
}

/// Handler registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No handler registered for the (provider, client id) pair
    #[error("No {provider} handler registered for client id {client_id}")]
    HandlerNotFound {
        /// Provider that was looked up
        provider: ProviderType,
        /// Client id that was looked up
        client_id: String,
    },

    /// Provider name outside the supported set
    #[error("Unsupported provider type: {0}")]
    UnsupportedProvider(String),

    /// Handler construction or initialization failed
    #[error("Handler initialization failed: {0}")]
    Initialization(#[from] SignInError),
}

/// Result type for validator operations
pub type Result<T> = std::result::Result<T, SignInError>;

/// Result type for steps inside a single provider
pub(crate) type ProviderResult<T> = std::result::Result<T, ProviderError>;
