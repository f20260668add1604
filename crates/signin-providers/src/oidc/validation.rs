//! Identity token validation with JWT signature verification.

use crate::errors::{ProviderError, ProviderResult};
use crate::oidc::jwks::JwksCache;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;

/// Clock skew tolerance in seconds
pub const LEEWAY_SECS: u64 = 60;

/// How the `iss` claim is matched
#[derive(Debug, Clone, Copy)]
pub enum IssuerRule<'a> {
    /// Issuer must equal one of the listed values
    OneOf(&'a [&'a str]),
    /// Issuer must contain the given value
    Contains(&'a str),
}

/// Claim expectations for one identity token
#[derive(Debug, Clone, Copy)]
pub struct IdTokenExpectations<'a> {
    /// Expected audience (our client id)
    pub audience: &'a str,
    /// Issuer rule
    pub issuer: IssuerRule<'a>,
}

/// Verify an identity token against a provider's key set
///
/// Checks signature (RS256 only), expiry, audience, issuer and subject
/// presence. Returns the raw decoded claims.
pub async fn verify_id_token(
    id_token: &str,
    keys: &JwksCache,
    expected: &IdTokenExpectations<'_>,
) -> ProviderResult<Value> {
    let header = decode_header(id_token)
        .map_err(|e| ProviderError::InvalidToken(format!("Failed to decode header: {}", e)))?;

    if header.alg != Algorithm::RS256 {
        return Err(ProviderError::InvalidToken(format!(
            "Invalid algorithm: expected RS256, got {:?}",
            header.alg
        )));
    }

    let kid = header.kid.ok_or_else(|| ProviderError::KeyNotFound {
        kid: "missing".to_string(),
    })?;

    let jwk = keys.get_public_key(&kid).await?;

    let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
        .map_err(|e| ProviderError::KeyFetch(format!("Invalid RSA key {}: {}", kid, e)))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[expected.audience]);
    if let IssuerRule::OneOf(issuers) = expected.issuer {
        validation.set_issuer(issuers);
    }
    validation.validate_exp = true;
    validation.validate_nbf = false;
    validation.leeway = LEEWAY_SECS;

    let token_data = decode::<Value>(id_token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::MissingRequiredClaim(_) => {
                ProviderError::ClaimValidation(format!("JWT validation failed: {}", e))
            }
            _ => ProviderError::InvalidToken(format!("JWT validation failed: {}", e)),
        }
    })?;

    let claims = token_data.claims;
    check_issuer(&claims, expected.issuer)?;
    check_audience(&claims, expected.audience)?;
    check_subject(&claims)?;

    Ok(claims)
}

fn check_issuer(claims: &Value, rule: IssuerRule<'_>) -> ProviderResult<()> {
    let iss = claims["iss"].as_str().unwrap_or_default();
    let accepted = match rule {
        IssuerRule::OneOf(issuers) => issuers.contains(&iss),
        IssuerRule::Contains(fragment) => !iss.is_empty() && iss.contains(fragment),
    };

    if !accepted {
        return Err(ProviderError::ClaimValidation(format!(
            "Issuer mismatch: got {:?}",
            iss
        )));
    }
    Ok(())
}

fn check_audience(claims: &Value, audience: &str) -> ProviderResult<()> {
    let matches = match &claims["aud"] {
        Value::String(aud) => aud == audience,
        Value::Array(auds) => auds.iter().any(|a| a.as_str() == Some(audience)),
        _ => false,
    };

    if !matches {
        return Err(ProviderError::ClaimValidation(format!(
            "Audience mismatch: expected {}",
            audience
        )));
    }
    Ok(())
}

fn check_subject(claims: &Value) -> ProviderResult<()> {
    match claims["sub"].as_str() {
        Some(sub) if !sub.is_empty() => Ok(()),
        _ => Err(ProviderError::ClaimValidation(
            "Missing subject claim".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issuer_rules() {
        let claims = json!({"iss": "https://appleid.apple.com"});

        assert!(check_issuer(&claims, IssuerRule::Contains("appleid.apple.com")).is_ok());
        assert!(check_issuer(&claims, IssuerRule::OneOf(&["https://appleid.apple.com"])).is_ok());
        assert!(matches!(
            check_issuer(&claims, IssuerRule::OneOf(&["appleid.apple.com"])),
            Err(ProviderError::ClaimValidation(_))
        ));
        assert!(check_issuer(&json!({}), IssuerRule::Contains("")).is_err());
    }

    #[test]
    fn test_audience_string_or_array() {
        assert!(check_audience(&json!({"aud": "client"}), "client").is_ok());
        assert!(check_audience(&json!({"aud": ["other", "client"]}), "client").is_ok());
        assert!(check_audience(&json!({"aud": "other"}), "client").is_err());
        assert!(check_audience(&json!({}), "client").is_err());
    }

    #[test]
    fn test_subject_must_be_present() {
        assert!(check_subject(&json!({"sub": "000123.abc"})).is_ok());
        assert!(check_subject(&json!({"sub": ""})).is_err());
        assert!(check_subject(&json!({"sub": 42})).is_err());
        assert!(check_subject(&json!({})).is_err());
    }
}
