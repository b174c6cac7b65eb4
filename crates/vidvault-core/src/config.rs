//! Configuration module
//!
//! Environment-driven configuration for the API: server, database, session verification,
//! on-disk layout, cache windows and thumbnail extraction.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const AUTH_CACHE_TTL_SECS: u64 = 600;
const AUTH_CACHE_MAX_ENTRIES: u64 = 100_000;
const VIEW_DEDUPE_TTL_SECS: u64 = 300;
const VIEW_DEDUPE_MAX_ENTRIES: u64 = 100_000;
const THUMBNAIL_OFFSET_SECS: f64 = 1.0;
const THUMBNAIL_TIMEOUT_SECS: u64 = 30;
const MAX_CHUNK_SIZE_MB: usize = 64;
const TRUSTED_PROXY_COUNT: usize = 1;

/// Parsed value of `name`, or `default` when unset or unparsable
fn var_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn required(name: &str) -> Result<String, anyhow::Error> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
}

/// Server-level settings shared by every component
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub session_secret: String,
    pub trusted_proxy_count: usize,
    pub environment: String,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    /// Root of the placed media tree: `<media_root>/<video_id>/...`
    pub media_root: PathBuf,
    /// Root of not-yet-placed transfer blobs
    pub staging_root: PathBuf,
    pub auth_cache_ttl_secs: u64,
    pub auth_cache_max_entries: u64,
    pub view_dedupe_ttl_secs: u64,
    pub view_dedupe_max_entries: u64,
    pub thumbnails_enabled: bool,
    pub ffmpeg_path: String,
    pub thumbnail_offset_secs: f64,
    pub thumbnail_timeout_secs: u64,
    pub max_chunk_size_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: var_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            session_secret: required("SESSION_SECRET")?,
            trusted_proxy_count: var_or("TRUSTED_PROXY_COUNT", TRUSTED_PROXY_COUNT),
            environment,
        };

        let media_root = PathBuf::from(required("MEDIA_ROOT")?);
        let staging_root = env::var("STAGING_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| media_root.join(".staging"));

        Ok(Config {
            base,
            database_url: required("DATABASE_URL")?,
            media_root,
            staging_root,
            auth_cache_ttl_secs: var_or("AUTH_CACHE_TTL_SECS", AUTH_CACHE_TTL_SECS),
            auth_cache_max_entries: var_or("AUTH_CACHE_MAX_ENTRIES", AUTH_CACHE_MAX_ENTRIES),
            view_dedupe_ttl_secs: var_or("VIEW_DEDUPE_TTL_SECS", VIEW_DEDUPE_TTL_SECS),
            view_dedupe_max_entries: var_or("VIEW_DEDUPE_MAX_ENTRIES", VIEW_DEDUPE_MAX_ENTRIES),
            thumbnails_enabled: var_or("THUMBNAILS_ENABLED", true),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            thumbnail_offset_secs: var_or("THUMBNAIL_OFFSET_SECS", THUMBNAIL_OFFSET_SECS),
            thumbnail_timeout_secs: var_or("THUMBNAIL_TIMEOUT_SECS", THUMBNAIL_TIMEOUT_SECS),
            max_chunk_size_bytes: var_or("MAX_CHUNK_SIZE_MB", MAX_CHUNK_SIZE_MB) * 1024 * 1024,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.session_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "SESSION_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.staging_root == self.media_root {
            return Err(anyhow::anyhow!(
                "STAGING_ROOT must differ from MEDIA_ROOT"
            ));
        }

        if self.auth_cache_ttl_secs == 0 || self.view_dedupe_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "AUTH_CACHE_TTL_SECS and VIEW_DEDUPE_TTL_SECS must be greater than zero"
            ));
        }

        if self.thumbnail_offset_secs < 0.0 {
            return Err(anyhow::anyhow!("THUMBNAIL_OFFSET_SECS must not be negative"));
        }

        if self.thumbnail_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.base.db_timeout_seconds
    }

    pub fn session_secret(&self) -> &str {
        &self.base.session_secret
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.base.trusted_proxy_count
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn auth_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.auth_cache_ttl_secs)
    }

    pub fn view_dedupe_ttl(&self) -> Duration {
        Duration::from_secs(self.view_dedupe_ttl_secs)
    }
}
