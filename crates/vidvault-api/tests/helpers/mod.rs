//! Test helpers: build AppState and router for integration tests.
//!
//! The router runs against the in-memory video store and temporary media and staging
//! roots, so these tests need no database.

pub mod auth;

use anyhow::Result;
use async_trait::async_trait;
use axum_test::TestServer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use vidvault_api::constants;
use vidvault_api::setup::{routes, services};
use vidvault_api::auth::JwtSessionResolver;
use vidvault_core::config::BaseConfig;
use vidvault_core::Config;
use vidvault_db::InMemoryVideoStore;
use vidvault_processing::ThumbnailExtractor;
use vidvault_storage::LocalStagingStore;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Writes a fixed stand-in image instead of running ffmpeg
pub struct FakeThumbnailer;

#[async_trait]
impl ThumbnailExtractor for FakeThumbnailer {
    async fn extract(&self, _video_path: &Path, output_path: &Path) -> Result<PathBuf> {
        tokio::fs::write(output_path, b"thumb").await?;
        Ok(output_path.to_path_buf())
    }
}

/// Test application: server, store and owned temp directories.
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryVideoStore,
    pub media_root: PathBuf,
    pub _media: TempDir,
    pub _staging: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn video_dir(&self, video_id: uuid::Uuid) -> PathBuf {
        self.media_root.join(video_id.to_string())
    }
}

pub fn create_test_config(media_root: &Path, staging_root: &Path) -> Config {
    Config {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 5,
            session_secret: auth::TEST_SESSION_SECRET.to_string(),
            trusted_proxy_count: 0,
            environment: "test".to_string(),
        },
        database_url: "postgres://unused".to_string(),
        media_root: media_root.to_path_buf(),
        staging_root: staging_root.to_path_buf(),
        auth_cache_ttl_secs: 600,
        auth_cache_max_entries: 1_000,
        view_dedupe_ttl_secs: 300,
        view_dedupe_max_entries: 1_000,
        thumbnails_enabled: true,
        ffmpeg_path: "ffmpeg".to_string(),
        thumbnail_offset_secs: 1.0,
        thumbnail_timeout_secs: 30,
        max_chunk_size_bytes: 1024 * 1024,
    }
}

/// Setup test app with an in-memory store and local staging.
pub async fn setup_test_app() -> TestApp {
    let media = tempfile::tempdir().expect("Failed to create media directory");
    let staging_dir = tempfile::tempdir().expect("Failed to create staging directory");
    let config = create_test_config(media.path(), staging_dir.path());

    let store = InMemoryVideoStore::new();
    let staging = LocalStagingStore::new(staging_dir.path())
        .await
        .expect("Failed to create staging store");

    let state = services::build_state(
        &config,
        Arc::new(store.clone()),
        Arc::new(staging),
        Arc::new(FakeThumbnailer),
        Arc::new(JwtSessionResolver::new(auth::TEST_SESSION_SECRET)),
    );
    let app = routes::setup_routes(&config, state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        media_root: media.path().to_path_buf(),
        _media: media,
        _staging: staging_dir,
    }
}
