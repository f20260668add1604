//! Provider credential validators.

pub mod apple;
pub(crate) mod exchange;
pub mod google;
pub mod linkedin;
pub mod snapchat;
pub mod x;

pub use apple::AppleValidator;
pub use google::GoogleValidator;
pub use linkedin::LinkedInValidator;
pub use snapchat::SnapChatValidator;
pub use x::XValidator;

use crate::errors::{ProviderError, SignInError};
use crate::types::ProviderType;
use tracing::warn;

/// Log a rejected credential and wrap the failure in the provider-named error
pub(crate) fn reject(provider: ProviderType, client_id: &str, error: ProviderError) -> SignInError {
    warn!(
        provider = %provider,
        client_id,
        error = %error,
        "Credential validation failed"
    );
    SignInError::new(provider, error)
}
