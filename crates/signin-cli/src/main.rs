/*!
 * Sign-in host
 *
 * Registers a handler for every provider tenant found in the environment and
 * exposes the registry operations a host application runs:
 * 1. Validate a sign-in artifact (authorization code or identity token)
 * 2. Rotate Apple client secrets
 * 3. Refresh Apple public keys
 * 4. Run both on a schedule until interrupted
 *
 * Usage:
 *   signin providers
 *   signin validate google <id-token>
 *   signin validate apple <code> --client-id com.example.web
 *   signin maintain --interval-hours 12
 */

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use signin_providers::{HandlerRegistry, ReqwestHttpClient};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;

#[derive(Parser)]
#[command(name = "signin")]
#[command(about = "Validate third-party sign-in credentials")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured provider tenants
    Providers,
    /// Validate an authorization code or identity token
    Validate {
        /// Provider name (apple, google, x, linkedin, snapchat)
        provider: String,

        /// Authorization code, or identity token for Google
        artifact: String,

        /// Client id of the handler to use (required when several are configured)
        #[arg(short, long)]
        client_id: Option<String>,
    },
    /// Regenerate every Apple client secret
    Rotate,
    /// Refresh the cached Apple public keys
    RefreshKeys,
    /// Rotate secrets and refresh keys periodically until interrupted
    Maintain {
        /// Override ROTATION_INTERVAL_HOURS
        #[arg(long)]
        interval_hours: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signin=info,signin_providers=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Providers => {
            commands::providers::list(&config);
            Ok(())
        }
        command => {
            let registry = build_registry(&config).await?;
            run(command, registry, &config).await
        }
    }
}

async fn run(command: Commands, registry: HandlerRegistry, config: &Config) -> Result<()> {
    match command {
        Commands::Providers => {
            commands::providers::list(config);
            Ok(())
        }
        Commands::Validate {
            provider,
            artifact,
            client_id,
        } => commands::validate::validate(&registry, &provider, &artifact, client_id).await,
        Commands::Rotate => commands::keys::rotate(&registry).await,
        Commands::RefreshKeys => commands::keys::refresh(&registry).await,
        Commands::Maintain { interval_hours } => {
            let interval = interval_hours
                .filter(|hours| *hours > 0)
                .map(|hours| Duration::from_secs(hours * 60 * 60))
                .unwrap_or(config.rotation_interval);
            commands::maintain::run(Arc::new(registry), interval).await
        }
    }
}

async fn build_registry(config: &Config) -> Result<HandlerRegistry> {
    let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;
    let registry = HandlerRegistry::new(Arc::new(http_client));

    for credentials in &config.credentials {
        let provider = credentials.provider();
        let client_id = credentials.client_id().to_string();
        registry
            .register_handler(credentials.clone())
            .await
            .with_context(|| format!("Failed to register {} handler {}", provider, client_id))?;
    }

    tracing::info!(handlers = config.credentials.len(), "Handler registry ready");
    Ok(registry)
}
