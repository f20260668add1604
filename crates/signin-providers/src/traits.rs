//! Sign-in trait definitions.

use crate::{
    errors::Result,
    http::{HttpRequest, HttpResponse, TransportError},
    types::{NormalizedUserRecord, ProviderType},
};
use async_trait::async_trait;

/// HTTP capability used for every provider call
///
/// Implementations own TLS, connection pooling and request timeouts. A timeout
/// is reported as a [`TransportError`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a request and return status and body
    async fn execute(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

/// Credential validator for one (provider, client id) pair
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Provider this validator speaks to
    fn provider(&self) -> ProviderType;

    /// Client identifier this validator was registered with
    fn client_id(&self) -> &str;

    /// Validate an authorization code or identity token
    ///
    /// Returns a normalized user record only after every provider-specific
    /// claim check has passed.
    async fn validate_user_credentials(&self, artifact: &str) -> Result<NormalizedUserRecord>;
}
