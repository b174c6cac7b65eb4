//! Process startup: configuration checks, telemetry, database, services and routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vidvault_core::Config;
use vidvault_infra::LogFormat;

/// Build the state and router for `config`. Nothing listens yet.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Invalid configuration")?;

    vidvault_infra::init_telemetry(LogFormat::from_env(), config.environment())
        .context("Failed to initialize telemetry")?;
    crate::error::expose_error_details(!config.is_production());
    tracing::info!(environment = config.environment(), "Starting vidvault");

    let pool = database::setup_database(&config).await?;
    let state = services::initialize_services(&config, pool).await?;
    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
