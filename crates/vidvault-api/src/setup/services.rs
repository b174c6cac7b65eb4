//! Service initialization and application state setup

use crate::auth::{JwtSessionResolver, SessionResolver, SessionState};
use crate::services::{
    AuthorizationGate, CompletionRouter, CounterService, VideoService,
};
use crate::state::{AppState, SecurityConfig, UploadState, VideoState};
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use vidvault_core::Config;
use vidvault_db::{VideoRecordStore, VideoRepository};
use vidvault_infra::{AuthorizationCache, ViewDedupeCache};
use vidvault_processing::{FfmpegThumbnailExtractor, NoopThumbnailExtractor, ThumbnailExtractor};
use vidvault_storage::{LocalStagingStore, MediaLayout, StagingStore};

/// Initialize the store, staging, thumbnailing and session lookup, returning the application state
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let store: Arc<dyn VideoRecordStore> = Arc::new(VideoRepository::new(pool));

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", config.media_root.display()))?;
    let staging: Arc<dyn StagingStore> = Arc::new(
        LocalStagingStore::new(config.staging_root.clone())
            .await
            .context("Failed to initialize staging store")?,
    );
    tracing::info!(
        media_root = %config.media_root.display(),
        staging_root = %config.staging_root.display(),
        "Local storage initialized"
    );

    let thumbnails: Arc<dyn ThumbnailExtractor> = if config.thumbnails_enabled {
        tracing::info!(
            ffmpeg_path = %config.ffmpeg_path,
            offset_secs = config.thumbnail_offset_secs,
            timeout_secs = config.thumbnail_timeout_secs,
            "Thumbnail extraction enabled"
        );
        Arc::new(
            FfmpegThumbnailExtractor::new(
                config.ffmpeg_path.clone(),
                config.thumbnail_offset_secs,
                Duration::from_secs(config.thumbnail_timeout_secs),
            )
            .context("Invalid thumbnail configuration")?,
        )
    } else {
        tracing::info!("Thumbnail extraction disabled");
        Arc::new(NoopThumbnailExtractor)
    };

    let resolver: Arc<dyn SessionResolver> =
        Arc::new(JwtSessionResolver::new(config.session_secret()));

    Ok(build_state(config, store, staging, thumbnails, resolver))
}

/// Assemble the application state from its collaborators
pub fn build_state(
    config: &Config,
    store: Arc<dyn VideoRecordStore>,
    staging: Arc<dyn StagingStore>,
    thumbnails: Arc<dyn ThumbnailExtractor>,
    resolver: Arc<dyn SessionResolver>,
) -> Arc<AppState> {
    let layout = MediaLayout::new(config.media_root.clone());

    let auth_cache = AuthorizationCache::new(config.auth_cache_max_entries, config.auth_cache_ttl());
    let view_dedupe =
        ViewDedupeCache::new(config.view_dedupe_max_entries, config.view_dedupe_ttl());
    tracing::info!(
        auth_cache_ttl_secs = auth_cache.ttl().as_secs(),
        view_dedupe_ttl_secs = view_dedupe.ttl().as_secs(),
        "Caches initialized"
    );

    let uploads = UploadState {
        gate: AuthorizationGate::new(auth_cache.clone(), store.clone()),
        router: CompletionRouter::new(staging.clone(), layout.clone(), store.clone(), thumbnails),
        staging: staging.clone(),
        max_chunk_size: config.max_chunk_size_bytes,
    };

    let videos = VideoState {
        service: VideoService::new(store.clone(), layout, staging, auth_cache),
        counters: CounterService::new(view_dedupe, store.clone()),
    };

    let security = SecurityConfig {
        session: Arc::new(SessionState {
            resolver,
            trusted_proxy_count: config.trusted_proxy_count(),
        }),
        cors_origins: config.cors_origins().to_vec(),
    };

    Arc::new(AppState {
        uploads,
        videos,
        security,
        store,
    })
}
