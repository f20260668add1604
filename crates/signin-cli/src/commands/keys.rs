/*!
 * Apple client secret rotation and key refresh
 */

use anyhow::{bail, Result};
use signin_providers::{HandlerRegistry, ProviderType};

pub async fn rotate(registry: &HandlerRegistry) -> Result<()> {
    let report = registry.rotate_apple_secrets().await;

    if report.results.is_empty() {
        println!("No Apple handlers registered");
        return Ok(());
    }

    for client_id in report.succeeded() {
        println!("  rotated  {}", client_id);
    }
    for (client_id, error) in report.failed() {
        println!("  failed   {}: {}", client_id, error);
    }

    if report.all_failed() {
        bail!("Every Apple client secret rotation failed");
    }
    Ok(())
}

pub async fn refresh(registry: &HandlerRegistry) -> Result<()> {
    if registry.handlers(ProviderType::Apple).await.is_empty() {
        println!("No Apple handlers registered");
        return Ok(());
    }

    let count = registry.refresh_apple_public_keys().await?;
    println!("Cached {} Apple public keys", count);
    Ok(())
}
