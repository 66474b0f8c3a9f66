//! task-manager - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the task API.

use task_manager::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_manager=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: enrichment={}, event bus={}",
        if config.enrichment.is_enabled() {
            "enabled"
        } else {
            "disabled"
        },
        if config.events.is_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    // Start HTTP server
    api::serve(config).await?;

    Ok(())
}
