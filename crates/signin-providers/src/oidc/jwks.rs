//! JWKS (JSON Web Key Set) fetching and caching.

use crate::errors::{ProviderError, ProviderResult};
use crate::http::HttpRequest;
use crate::traits::HttpClient;
use crate::types::{current_timestamp, JwksKey, JwksKeySet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Shared cache of a provider's published signing keys
///
/// One cache is shared by every validator of the same provider. Readers always
/// see a complete key set: a refresh swaps the whole set in one step and a
/// failed refresh leaves the previous set in place. Refreshes are serialized.
pub struct JwksCache {
    jwks_uri: String,
    http_client: Arc<dyn HttpClient>,
    keys: RwLock<Arc<JwksKeySet>>,
    refresh_lock: Mutex<()>,
    fetched_at: AtomicU64,
}

impl JwksCache {
    /// Create an empty cache for the key set published at `jwks_uri`
    pub fn new(jwks_uri: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            http_client,
            keys: RwLock::new(Arc::new(JwksKeySet::default())),
            refresh_lock: Mutex::new(()),
            fetched_at: AtomicU64::new(0),
        }
    }

    /// URI the key set is fetched from
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// Unix timestamp of the last successful refresh, `None` before the first one
    pub fn fetched_at(&self) -> Option<u64> {
        match self.fetched_at.load(Ordering::Acquire) {
            0 => None,
            ts => Some(ts),
        }
    }

    /// Current key set
    pub async fn snapshot(&self) -> Arc<JwksKeySet> {
        self.keys.read().await.clone()
    }

    /// Fetch the published key set and replace the cached one
    ///
    /// Returns the number of keys now cached.
    pub async fn refresh_public_keys(&self) -> ProviderResult<usize> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Look up a key, refreshing at most once on a cache miss
    pub async fn get_public_key(&self, kid: &str) -> ProviderResult<JwksKey> {
        if let Some(key) = self.snapshot().await.find_key(kid) {
            return Ok(key.clone());
        }

        let _guard = self.refresh_lock.lock().await;

        // A concurrent refresh may have brought the key in while we waited
        if let Some(key) = self.snapshot().await.find_key(kid) {
            return Ok(key.clone());
        }

        debug!(kid, jwks_uri = %self.jwks_uri, "Signing key not cached, refreshing");
        self.refresh_locked().await?;

        self.snapshot()
            .await
            .find_key(kid)
            .cloned()
            .ok_or_else(|| ProviderError::KeyNotFound {
                kid: kid.to_string(),
            })
    }

    async fn refresh_locked(&self) -> ProviderResult<usize> {
        let jwks = self.fetch().await?;
        let count = jwks.keys.len();

        *self.keys.write().await = Arc::new(jwks);
        self.fetched_at.store(current_timestamp().max(1), Ordering::Release);

        info!(jwks_uri = %self.jwks_uri, keys = count, "Refreshed signing keys");
        Ok(count)
    }

    async fn fetch(&self) -> ProviderResult<JwksKeySet> {
        let response = self
            .http_client
            .execute(HttpRequest::get(&self.jwks_uri))
            .await
            .map_err(|e| ProviderError::KeyFetch(e.to_string()))?;

        if !response.is_success() {
            return Err(ProviderError::KeyFetch(format!(
                "JWKS endpoint returned status {}: {}",
                response.status, response.body
            )));
        }

        let jwks: JwksKeySet = response
            .json()
            .map_err(|e| ProviderError::KeyFetch(format!("Failed to parse JWKS: {}", e)))?;

        if jwks.keys.is_empty() {
            return Err(ProviderError::KeyFetch(
                "JWKS endpoint returned an empty key set".to_string(),
            ));
        }

        Ok(jwks)
    }
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache")
            .field("jwks_uri", &self.jwks_uri)
            .field("fetched_at", &self.fetched_at())
            .finish_non_exhaustive()
    }
}
