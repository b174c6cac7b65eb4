//! Postgres pool and schema migrations

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::PathBuf;
use std::time::Duration;
use vidvault_core::Config;

const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Connect to the video store and bring its schema up to date
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let pool = connect(config).await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn connect(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        acquire_timeout_secs = config.db_timeout_seconds(),
        "Database pool ready"
    );
    Ok(pool)
}

/// `migrations/` at the workspace root
fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations")
}

async fn migrate(pool: &PgPool) -> Result<()> {
    let dir = migrations_dir();
    let migrator = Migrator::new(dir.clone())
        .await
        .with_context(|| format!("Failed to load migrations from {}", dir.display()))?;
    migrator
        .run(pool)
        .await
        .context("Failed to apply migrations")?;
    tracing::info!(count = migrator.iter().count(), "Migrations applied");
    Ok(())
}
