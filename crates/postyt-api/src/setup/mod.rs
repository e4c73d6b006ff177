//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use postyt_core::{Config, EncryptionService};
use postyt_db::AccountRepository;
use postyt_platforms::{http_client, AdapterRegistry};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;

    tokio::fs::create_dir_all(config.upload_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_dir().display()
            )
        })?;

    let encryption = EncryptionService::from_base64_key(config.encryption_key())
        .map_err(|e| anyhow::anyhow!("Invalid ENCRYPTION_KEY: {}", e))?;
    let accounts = Arc::new(AccountRepository::new(pool, encryption));

    let http = http_client().map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
    let registry = AdapterRegistry::from_config(&config, http);
    tracing::info!(
        platforms = ?registry.implemented_platforms(),
        "Platform adapters registered"
    );

    let state = Arc::new(AppState::new(&config, accounts, registry));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
