/*!
 * List configured providers
 */

use signin_providers::ProviderType;

use crate::config::Config;

pub fn list(config: &Config) {
    println!("=== Configured Providers ===");

    for provider in ProviderType::ALL {
        let client_ids: Vec<&str> = config
            .credentials
            .iter()
            .filter(|c| c.provider() == provider)
            .map(|c| c.client_id())
            .collect();

        if client_ids.is_empty() {
            println!("  {:<10} (not configured)", provider);
        } else {
            println!("  {:<10} {}", provider, client_ids.join(", "));
        }
    }
}
