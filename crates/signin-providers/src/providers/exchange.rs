//! Authorization code exchange and user info helpers shared by code-exchange providers.

use crate::errors::{ProviderError, ProviderResult};
use crate::http::HttpRequest;
use crate::traits::HttpClient;
use crate::types::ExchangedTokenSet;
use serde_json::Value;
use tracing::debug;

/// How the client authenticates at the token endpoint
#[derive(Clone, Copy)]
pub(crate) enum ClientAuth<'a> {
    /// HTTP Basic with client id and secret
    Basic {
        client_id: &'a str,
        client_secret: &'a str,
    },
    /// `client_id` and `client_secret` in the form body
    FormBody {
        client_id: &'a str,
        client_secret: &'a str,
    },
}

/// Exchange an authorization code for provider tokens
///
/// `params` carries everything besides `grant_type` and the client credentials
/// (code, redirect URI, PKCE verifier). Not retried.
pub(crate) async fn exchange_code(
    http_client: &dyn HttpClient,
    token_url: &str,
    auth: ClientAuth<'_>,
    params: &[(&str, &str)],
) -> ProviderResult<ExchangedTokenSet> {
    let mut form: Vec<(&str, &str)> = vec![("grant_type", "authorization_code")];
    form.extend_from_slice(params);
    if let ClientAuth::FormBody {
        client_id,
        client_secret,
    } = auth
    {
        form.push(("client_id", client_id));
        form.push(("client_secret", client_secret));
    }

    let mut request = HttpRequest::post_form(token_url, &form);
    if let ClientAuth::Basic {
        client_id,
        client_secret,
    } = auth
    {
        request = request.basic_auth(client_id, client_secret);
    }

    debug!(token_url, "Exchanging authorization code");
    let response = http_client
        .execute(request)
        .await
        .map_err(ProviderError::exchange_transport)?;

    if !response.is_success() {
        return Err(ProviderError::Exchange {
            status: Some(response.status),
            body: response.body,
        });
    }

    response.json().map_err(|e| {
        ProviderError::InvalidResponse(format!("Failed to parse token response: {}", e))
    })
}

/// Fail unless every required scope was granted
///
/// Providers that do not echo a scope string are not checked.
pub(crate) fn require_scopes(tokens: &ExchangedTokenSet, required: &[&str]) -> ProviderResult<()> {
    let Some(granted) = tokens.scope.as_deref() else {
        return Ok(());
    };

    let scopes = tokens.granted_scopes();
    let missing: Vec<String> = required
        .iter()
        .filter(|r| !scopes.contains(*r))
        .map(|r| r.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ProviderError::InsufficientScope {
            missing,
            granted: granted.to_string(),
        });
    }
    Ok(())
}

/// Call a provider "who am I" endpoint with the access token
pub(crate) async fn fetch_user_info(
    http_client: &dyn HttpClient,
    user_info_url: &str,
    access_token: &str,
) -> ProviderResult<Value> {
    debug!(user_info_url, "Fetching user info");
    let response = http_client
        .execute(HttpRequest::get(user_info_url).bearer_auth(access_token))
        .await
        .map_err(ProviderError::user_info_transport)?;

    if !response.is_success() {
        return Err(ProviderError::UserInfo {
            status: Some(response.status),
            body: response.body,
        });
    }

    response
        .json()
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse user info: {}", e)))
}
