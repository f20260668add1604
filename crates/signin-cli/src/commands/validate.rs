/*!
 * Validate a sign-in artifact
 */

use anyhow::{bail, Result};
use signin_providers::{CredentialValidator, Handler, HandlerRegistry, ProviderType};

pub async fn validate(
    registry: &HandlerRegistry,
    provider: &str,
    artifact: &str,
    client_id: Option<String>,
) -> Result<()> {
    let provider: ProviderType = provider.parse()?;
    let handler = select_handler(registry, provider, client_id.as_deref()).await?;

    let record = handler.validate_user_credentials(artifact).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

async fn select_handler(
    registry: &HandlerRegistry,
    provider: ProviderType,
    client_id: Option<&str>,
) -> Result<Handler> {
    if let Some(client_id) = client_id {
        return Ok(registry.get_handler(provider, client_id).await?);
    }

    let mut handlers = registry.handlers(provider).await;
    match handlers.len() {
        0 => bail!("No {} handler is configured", provider),
        1 => Ok(handlers.remove(0)),
        n => bail!(
            "{} {} handlers are configured; choose one with --client-id",
            n,
            provider
        ),
    }
}
