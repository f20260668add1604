//! Handler registry keyed by (provider, client id).
//!
//! The registry lazily constructs one validator per (provider, client id) pair
//! and hands out the same instance on every later registration or lookup. It is
//! an ordinary value: build it once at startup and share it (usually behind an
//! `Arc`) with whatever serves sign-in requests.
//!
//! Concurrent registrations of the same pair converge on a single instance; the
//! provider-specific initialization (Apple key fetch and secret generation)
//! runs once. A failed initialization stores nothing, so the next registration
//! tries again.

use crate::config::ProviderCredentials;
use crate::errors::{RegistryError, Result, SignInError};
use crate::oidc::JwksCache;
use crate::providers::{
    AppleValidator, GoogleValidator, LinkedInValidator, SnapChatValidator, XValidator,
};
use crate::traits::{CredentialValidator, HttpClient};
use crate::types::{NormalizedUserRecord, ProviderType};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

/// Registered validator instance
///
/// Cloning a handler clones the reference, not the validator.
#[derive(Debug, Clone)]
pub enum Handler {
    /// Sign in with Apple
    Apple(Arc<AppleValidator>),
    /// Google Identity
    Google(Arc<GoogleValidator>),
    /// X (Twitter)
    X(Arc<XValidator>),
    /// LinkedIn
    LinkedIn(Arc<LinkedInValidator>),
    /// SnapChat
    SnapChat(Arc<SnapChatValidator>),
}

impl Handler {
    /// Whether both handlers refer to the same validator instance
    pub fn same_instance(&self, other: &Handler) -> bool {
        match (self, other) {
            (Handler::Apple(a), Handler::Apple(b)) => Arc::ptr_eq(a, b),
            (Handler::Google(a), Handler::Google(b)) => Arc::ptr_eq(a, b),
            (Handler::X(a), Handler::X(b)) => Arc::ptr_eq(a, b),
            (Handler::LinkedIn(a), Handler::LinkedIn(b)) => Arc::ptr_eq(a, b),
            (Handler::SnapChat(a), Handler::SnapChat(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Apple validator, if this is an Apple handler
    pub fn as_apple(&self) -> Option<&Arc<AppleValidator>> {
        match self {
            Handler::Apple(validator) => Some(validator),
            _ => None,
        }
    }

    fn validator(&self) -> &dyn CredentialValidator {
        match self {
            Handler::Apple(v) => v.as_ref(),
            Handler::Google(v) => v.as_ref(),
            Handler::X(v) => v.as_ref(),
            Handler::LinkedIn(v) => v.as_ref(),
            Handler::SnapChat(v) => v.as_ref(),
        }
    }
}

#[async_trait]
impl CredentialValidator for Handler {
    fn provider(&self) -> ProviderType {
        self.validator().provider()
    }

    fn client_id(&self) -> &str {
        self.validator().client_id()
    }

    async fn validate_user_credentials(&self, artifact: &str) -> Result<NormalizedUserRecord> {
        self.validator().validate_user_credentials(artifact).await
    }
}

/// Outcome of rotating one Apple client secret
#[derive(Debug)]
pub struct SecretRotation {
    /// Client id of the rotated validator
    pub client_id: String,
    /// Rotation result
    pub outcome: Result<()>,
}

/// Per-instance results of a bulk Apple secret rotation
///
/// Every instance is attempted; one failure never hides another's result.
#[derive(Debug, Default)]
pub struct RotationReport {
    /// One entry per registered Apple validator
    pub results: Vec<SecretRotation>,
}

impl RotationReport {
    /// Client ids whose secret was rotated
    pub fn succeeded(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_ok())
            .map(|r| r.client_id.as_str())
            .collect()
    }

    /// Client ids and errors of failed rotations
    pub fn failed(&self) -> Vec<(&str, &SignInError)> {
        self.results
            .iter()
            .filter_map(|r| match &r.outcome {
                Err(e) => Some((r.client_id.as_str(), e)),
                Ok(()) => None,
            })
            .collect()
    }

    /// True when at least one rotation ran and none succeeded
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.outcome.is_err())
    }
}

/// Client id → validator map for one provider
struct HandlerDirectory<V> {
    entries: RwLock<HashMap<String, Arc<OnceCell<Arc<V>>>>>,
}

impl<V> HandlerDirectory<V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the stored instance or build, initialize and store one
    ///
    /// At most one `init` runs at a time per client id. The slot stays empty if
    /// `init` fails.
    async fn get_or_try_init<F, Fut>(&self, client_id: &str, init: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<V>>>,
    {
        let existing = self.entries.read().await.get(client_id).cloned();
        let cell = match existing {
            Some(cell) => cell,
            None => self
                .entries
                .write()
                .await
                .entry(client_id.to_string())
                .or_default()
                .clone(),
        };

        cell.get_or_try_init(init).await.cloned()
    }

    async fn get(&self, client_id: &str) -> Option<Arc<V>> {
        self.entries
            .read()
            .await
            .get(client_id)
            .and_then(|cell| cell.get().cloned())
    }

    async fn initialized(&self) -> Vec<Arc<V>> {
        self.entries
            .read()
            .await
            .values()
            .filter_map(|cell| cell.get().cloned())
            .collect()
    }
}

/// Directory of validators for every provider
pub struct HandlerRegistry {
    http_client: Arc<dyn HttpClient>,
    apple_keys: Arc<JwksCache>,
    google_keys: Arc<JwksCache>,
    linkedin_keys: Arc<JwksCache>,
    apple: HandlerDirectory<AppleValidator>,
    google: HandlerDirectory<GoogleValidator>,
    x: HandlerDirectory<XValidator>,
    linkedin: HandlerDirectory<LinkedInValidator>,
    snapchat: HandlerDirectory<SnapChatValidator>,
}

impl HandlerRegistry {
    /// Create an empty registry using `http_client` for every provider call
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            apple_keys: Arc::new(AppleValidator::key_cache(http_client.clone())),
            google_keys: Arc::new(GoogleValidator::key_cache(http_client.clone())),
            linkedin_keys: Arc::new(LinkedInValidator::key_cache(http_client.clone())),
            http_client,
            apple: HandlerDirectory::new(),
            google: HandlerDirectory::new(),
            x: HandlerDirectory::new(),
            linkedin: HandlerDirectory::new(),
            snapchat: HandlerDirectory::new(),
        }
    }

    /// Key cache shared by all Apple validators
    pub fn apple_keys(&self) -> &Arc<JwksCache> {
        &self.apple_keys
    }

    /// Register a handler, or return the one already registered for the client id
    ///
    /// Registration is idempotent: the first registration for a
    /// (provider, client id) pair wins and later credentials are ignored.
    pub async fn register_handler(
        &self,
        credentials: ProviderCredentials,
    ) -> std::result::Result<Handler, RegistryError> {
        let provider = credentials.provider();
        let client_id = credentials.client_id().to_string();
        debug!(provider = %provider, client_id = %client_id, "Registering handler");

        let handler = match credentials {
            ProviderCredentials::Apple(credentials) => {
                let http_client = self.http_client.clone();
                let keys = self.apple_keys.clone();
                let validator = self
                    .apple
                    .get_or_try_init(&client_id, || async move {
                        let validator = AppleValidator::new(credentials, http_client, keys);
                        validator.initialize().await?;
                        Ok::<_, SignInError>(Arc::new(validator))
                    })
                    .await?;
                Handler::Apple(validator)
            }
            ProviderCredentials::Google(credentials) => {
                let keys = self.google_keys.clone();
                let validator = self
                    .google
                    .get_or_try_init(&client_id, || async move {
                        let validator = GoogleValidator::new(credentials, keys);
                        validator.initialize().await?;
                        Ok::<_, SignInError>(Arc::new(validator))
                    })
                    .await?;
                Handler::Google(validator)
            }
            ProviderCredentials::X(credentials) => {
                let http_client = self.http_client.clone();
                let validator = self
                    .x
                    .get_or_try_init(&client_id, || async move {
                        Ok(Arc::new(XValidator::new(credentials, http_client)))
                    })
                    .await?;
                Handler::X(validator)
            }
            ProviderCredentials::LinkedIn(credentials) => {
                let http_client = self.http_client.clone();
                let keys = self.linkedin_keys.clone();
                let validator = self
                    .linkedin
                    .get_or_try_init(&client_id, || async move {
                        Ok(Arc::new(LinkedInValidator::new(credentials, http_client, keys)))
                    })
                    .await?;
                Handler::LinkedIn(validator)
            }
            ProviderCredentials::SnapChat(credentials) => {
                let http_client = self.http_client.clone();
                let validator = self
                    .snapchat
                    .get_or_try_init(&client_id, || async move {
                        Ok(Arc::new(SnapChatValidator::new(credentials, http_client)))
                    })
                    .await?;
                Handler::SnapChat(validator)
            }
        };

        info!(provider = %provider, client_id = %client_id, "Handler registered");
        Ok(handler)
    }

    /// Look up a registered handler; never creates one
    pub async fn get_handler(
        &self,
        provider: ProviderType,
        client_id: &str,
    ) -> std::result::Result<Handler, RegistryError> {
        let handler = match provider {
            ProviderType::Apple => self.apple.get(client_id).await.map(Handler::Apple),
            ProviderType::Google => self.google.get(client_id).await.map(Handler::Google),
            ProviderType::X => self.x.get(client_id).await.map(Handler::X),
            ProviderType::LinkedIn => self.linkedin.get(client_id).await.map(Handler::LinkedIn),
            ProviderType::SnapChat => self.snapchat.get(client_id).await.map(Handler::SnapChat),
        };

        handler.ok_or_else(|| RegistryError::HandlerNotFound {
            provider,
            client_id: client_id.to_string(),
        })
    }

    /// All registered handlers of one provider
    pub async fn handlers(&self, provider: ProviderType) -> Vec<Handler> {
        match provider {
            ProviderType::Apple => wrap(self.apple.initialized().await, Handler::Apple),
            ProviderType::Google => wrap(self.google.initialized().await, Handler::Google),
            ProviderType::X => wrap(self.x.initialized().await, Handler::X),
            ProviderType::LinkedIn => wrap(self.linkedin.initialized().await, Handler::LinkedIn),
            ProviderType::SnapChat => wrap(self.snapchat.initialized().await, Handler::SnapChat),
        }
    }

    /// Regenerate the client secret of every registered Apple validator
    ///
    /// Rotations run concurrently and independently; the report carries one
    /// result per instance.
    pub async fn rotate_apple_secrets(&self) -> RotationReport {
        let validators = self.apple.initialized().await;

        let results = join_all(validators.into_iter().map(|validator| async move {
            let client_id = validator.client_id().to_string();
            let outcome = validator.generate_client_secret().await.map(|_| ());
            if let Err(e) = &outcome {
                warn!(client_id = %client_id, error = %e, "Apple client secret rotation failed");
            }
            SecretRotation { client_id, outcome }
        }))
        .await;

        let report = RotationReport { results };
        info!(
            rotated = report.succeeded().len(),
            failed = report.failed().len(),
            "Apple client secret rotation finished"
        );
        report
    }

    /// Refresh the Apple public keys shared by every Apple validator
    pub async fn refresh_apple_public_keys(&self) -> Result<usize> {
        self.apple_keys
            .refresh_public_keys()
            .await
            .map_err(|e| SignInError::new(ProviderType::Apple, e))
    }
}

fn wrap<V>(validators: Vec<Arc<V>>, variant: fn(Arc<V>) -> Handler) -> Vec<Handler> {
    validators.into_iter().map(variant).collect()
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("apple_keys", &self.apple_keys)
            .field("google_keys", &self.google_keys)
            .field("linkedin_keys", &self.linkedin_keys)
            .finish_non_exhaustive()
    }
}
