//! OpenID Connect support shared by identity-token providers.
//!
//! This module provides:
//! - JWKS fetching and caching with a bounded refresh on key miss
//! - Identity token validation with JWT signature verification

pub mod jwks;
pub mod validation;

// Re-export commonly used items
pub use jwks::JwksCache;
pub use validation::{verify_id_token, IdTokenExpectations, IssuerRule};
