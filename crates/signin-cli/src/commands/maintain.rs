/*!
 * Scheduled Apple secret rotation and key refresh
 */

use anyhow::Result;
use signin_providers::HandlerRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub async fn run(registry: Arc<HandlerRegistry>, interval: Duration) -> Result<()> {
    info!(interval_secs = interval.as_secs(), "Starting maintenance loop");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Handlers were initialized at registration; skip the immediate tick
    ticker.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => run_once(&registry).await,
            _ = &mut shutdown => break,
        }
    }

    info!("Maintenance loop stopped");
    Ok(())
}

async fn run_once(registry: &HandlerRegistry) {
    let report = registry.rotate_apple_secrets().await;
    if report.all_failed() {
        warn!(
            failed = report.failed().len(),
            "Every Apple client secret rotation failed"
        );
    }

    if let Err(e) = registry.refresh_apple_public_keys().await {
        warn!(error = %e, "Scheduled Apple key refresh failed, keeping cached keys");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
