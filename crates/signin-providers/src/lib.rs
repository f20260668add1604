//! Sign-in credential validation for third-party identity providers.
//!
//! This crate provides:
//! - Provider credential validators (Apple, Google, X, LinkedIn, SnapChat)
//! - A shared JWKS cache used for identity-token signature verification
//! - Apple client-secret generation and rotation
//! - A handler registry keyed by (provider, client id)
//!
//! # Security Note
//! Provider tokens are returned to the caller inside the normalized user record
//! and are never cached by this crate. Only provider public keys and the Apple
//! client secret are held in memory between calls.

#![warn(missing_docs)]

pub mod config;
pub mod errors;
pub mod http;
pub mod oidc;
pub mod providers;
pub mod registry;
pub mod traits;
pub mod types;


// Re-exports
pub use config::{
    AppleCredentials, ClientSecretCredentials, GoogleCredentials, LinkedInCredentials,
    ProviderCredentials, SnapChatCredentials, XCredentials,
};
pub use errors::{ProviderError, RegistryError, Result, SignInError};
pub use http::{HttpRequest, HttpResponse, Method, ReqwestHttpClient, TransportError};
pub use oidc::JwksCache;
pub use providers::{
    AppleValidator, GoogleValidator, LinkedInValidator, SnapChatValidator, XValidator,
};
pub use registry::{Handler, HandlerRegistry, RotationReport, SecretRotation};
pub use traits::{CredentialValidator, HttpClient};
pub use types::*;
