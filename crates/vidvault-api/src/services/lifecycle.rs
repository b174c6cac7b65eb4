//! Owner actions on a video: read, privacy changes and deletion.

use std::sync::Arc;
use uuid::Uuid;
use vidvault_core::{AppError, UserIdentity, Video, VideoPrivacy};
use vidvault_db::VideoRecordStore;
use vidvault_infra::AuthorizationCache;
use vidvault_storage::{MediaLayout, StagingStore};

use crate::error::storage_error_to_app_error;

#[derive(Clone)]
pub struct VideoService {
    store: Arc<dyn VideoRecordStore>,
    layout: MediaLayout,
    staging: Arc<dyn StagingStore>,
    auth_cache: AuthorizationCache,
}

impl VideoService {
    pub fn new(
        store: Arc<dyn VideoRecordStore>,
        layout: MediaLayout,
        staging: Arc<dyn StagingStore>,
        auth_cache: AuthorizationCache,
    ) -> Self {
        Self {
            store,
            layout,
            staging,
            auth_cache,
        }
    }

    /// Fetch a video. Videos that are not publicly visible exist only for their owner.
    pub async fn get_video(&self, id: Uuid, viewer: Option<UserIdentity>) -> Result<Video, AppError> {
        let video = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        let is_owner = viewer.is_some_and(|v| video.is_owned_by(v.id()));
        if !video.is_publicly_visible() && !is_owner {
            return Err(not_found(id));
        }
        Ok(video)
    }

    pub async fn set_privacy(
        &self,
        id: Uuid,
        owner: UserIdentity,
        privacy: VideoPrivacy,
    ) -> Result<Video, AppError> {
        if !privacy.is_owner_selectable() {
            return Err(AppError::InvalidInput(format!(
                "Privacy {} cannot be set explicitly",
                privacy
            )));
        }

        if !self.store.set_privacy(id, owner.id(), privacy).await? {
            return Err(self.ownership_error(id).await?);
        }
        tracing::info!(video_id = %id, privacy = %privacy, "Video privacy changed");

        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }

    /// Forget the cached upload authorization, then remove the on-disk tree, anything
    /// still staged and the row.
    pub async fn delete_video(&self, id: Uuid, owner: UserIdentity) -> Result<(), AppError> {
        if !self.store.owned_by(id, owner.id()).await? {
            return Err(self.ownership_error(id).await?);
        }

        // Chunks admitted from the cache must not land in a tree being removed
        self.auth_cache.invalidate(&id);

        self.layout
            .remove_video(id)
            .await
            .map_err(storage_error_to_app_error)?;

        if let Err(e) = self.staging.discard_video(id).await {
            tracing::warn!(error = %e, video_id = %id, "Failed to discard staged blobs of deleted video");
        }

        self.store.delete(id, owner.id()).await?;
        // Drop an admission re-cached while the tree was going away
        self.auth_cache.invalidate(&id);

        tracing::info!(video_id = %id, user_id = %owner, "Video deleted");
        Ok(())
    }

    /// NotFound for a missing row, Unauthorized for someone else's
    async fn ownership_error(&self, id: Uuid) -> Result<AppError, AppError> {
        Ok(if self.store.exists(id).await? {
            AppError::Unauthorized("Video belongs to another user".to_string())
        } else {
            not_found(id)
        })
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Video {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;
    use tempfile::TempDir;
    use vidvault_core::models::StagedBlob;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use vidvault_db::{ClaimOutcome, InMemoryVideoStore, VideoDetails};
    use vidvault_storage::LocalStagingStore;

    struct Fixture {
        _dirs: (TempDir, TempDir),
        store: InMemoryVideoStore,
        staging: Arc<LocalStagingStore>,
        cache: AuthorizationCache,
        service: VideoService,
        owner: UserIdentity,
        video_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let media = TempDir::new().unwrap();
        let staging_dir = TempDir::new().unwrap();
        let store = InMemoryVideoStore::new();
        let staging = Arc::new(LocalStagingStore::new(staging_dir.path()).await.unwrap());
        let cache = AuthorizationCache::new(100, Duration::from_secs(600));
        let service = VideoService::new(
            Arc::new(store.clone()),
            MediaLayout::new(media.path()),
            staging.clone(),
            cache.clone(),
        );
        let owner = UserIdentity::new(Uuid::new_v4());
        let video_id = Uuid::new_v4();
        store.claim(video_id, owner.id()).await.unwrap();

        Fixture {
            _dirs: (media, staging_dir),
            store,
            staging,
            cache,
            service,
            owner,
            video_id,
        }
    }

    #[tokio::test]
    async fn test_processing_video_visible_only_to_owner() {
        let f = fixture().await;
        let stranger = UserIdentity::new(Uuid::new_v4());

        assert!(f.service.get_video(f.video_id, Some(f.owner)).await.is_ok());
        assert!(matches!(
            f.service.get_video(f.video_id, Some(stranger)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.get_video(f.video_id, None).await,
            Err(AppError::NotFound(_))
        ));

        f.service
            .set_privacy(f.video_id, f.owner, VideoPrivacy::Unlisted)
            .await
            .unwrap();
        assert!(f.service.get_video(f.video_id, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_privacy_rules() {
        let f = fixture().await;
        let stranger = UserIdentity::new(Uuid::new_v4());

        let video = f
            .service
            .set_privacy(f.video_id, f.owner, VideoPrivacy::Public)
            .await
            .unwrap();
        assert_eq!(video.privacy, VideoPrivacy::Public);

        assert!(matches!(
            f.service.set_privacy(f.video_id, f.owner, VideoPrivacy::Processing).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service.set_privacy(f.video_id, stranger, VideoPrivacy::Private).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.set_privacy(Uuid::new_v4(), f.owner, VideoPrivacy::Private).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(f.store.snapshot(f.video_id).unwrap().privacy, VideoPrivacy::Public);
    }

    #[tokio::test]
    async fn test_delete_removes_tree_row_and_cache_entry() {
        let f = fixture().await;
        let dir = MediaLayout::new(f.service.layout.root()).video_dir(f.video_id);
        tokio::fs::create_dir_all(dir.join("extra")).await.unwrap();
        tokio::fs::write(dir.join("clip.mp4"), b"video").await.unwrap();
        let blob = StagedBlob::new(f.video_id, Uuid::new_v4());
        f.staging.append(&blob, 0, Bytes::from_static(b"x")).await.unwrap();
        f.cache.put(f.video_id, f.owner);

        f.service.delete_video(f.video_id, f.owner).await.unwrap();

        assert!(!dir.exists());
        assert!(!f.staging.exists(&blob).await.unwrap());
        assert!(f.store.snapshot(f.video_id).is_none());
        assert!(f.cache.get(&f.video_id).is_none());
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_refused() {
        let f = fixture().await;
        let stranger = UserIdentity::new(Uuid::new_v4());

        assert!(matches!(
            f.service.delete_video(f.video_id, stranger).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.delete_video(Uuid::new_v4(), f.owner).await,
            Err(AppError::NotFound(_))
        ));
        assert!(f.store.snapshot(f.video_id).is_some());
    }

    /// Records whether the upload authorization was already gone when the row was deleted
    struct CacheWatchingStore {
        inner: InMemoryVideoStore,
        cache: AuthorizationCache,
        cached_at_delete: AtomicBool,
    }

    #[async_trait]
    impl VideoRecordStore for CacheWatchingStore {
        async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
            self.inner.exists(id).await
        }

        async fn owned_by(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
            self.inner.owned_by(id, owner_id).await
        }

        async fn claim(&self, id: Uuid, owner_id: Uuid) -> Result<ClaimOutcome, AppError> {
            self.inner.claim(id, owner_id).await
        }

        async fn apply_metadata(
            &self,
            id: Uuid,
            owner_id: Uuid,
            details: &VideoDetails,
        ) -> Result<ClaimOutcome, AppError> {
            self.inner.apply_metadata(id, owner_id, details).await
        }

        async fn set_privacy(
            &self,
            id: Uuid,
            owner_id: Uuid,
            privacy: VideoPrivacy,
        ) -> Result<bool, AppError> {
            self.inner.set_privacy(id, owner_id, privacy).await
        }

        async fn set_size(&self, id: Uuid, size_bytes: i64) -> Result<(), AppError> {
            self.inner.set_size(id, size_bytes).await
        }

        async fn increment_views(&self, id: Uuid) -> Result<bool, AppError> {
            self.inner.increment_views(id).await
        }

        async fn increment_downloads(&self, id: Uuid) -> Result<bool, AppError> {
            self.inner.increment_downloads(id).await
        }

        async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
            self.inner.get(id).await
        }

        async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
            self.cached_at_delete
                .store(self.cache.get(&id).is_some(), Ordering::SeqCst);
            self.inner.delete(id, owner_id).await
        }
    }

    #[tokio::test]
    async fn test_delete_forgets_authorization_before_removing_anything() {
        let media = TempDir::new().unwrap();
        let staging_dir = TempDir::new().unwrap();
        let cache = AuthorizationCache::new(100, Duration::from_secs(600));
        let store = Arc::new(CacheWatchingStore {
            inner: InMemoryVideoStore::new(),
            cache: cache.clone(),
            cached_at_delete: AtomicBool::new(true),
        });
        let service = VideoService::new(
            store.clone(),
            MediaLayout::new(media.path()),
            Arc::new(LocalStagingStore::new(staging_dir.path()).await.unwrap()),
            cache.clone(),
        );
        let owner = UserIdentity::new(Uuid::new_v4());
        let video_id = Uuid::new_v4();
        store.claim(video_id, owner.id()).await.unwrap();
        cache.put(video_id, owner);

        service.delete_video(video_id, owner).await.unwrap();

        assert!(!store.cached_at_delete.load(Ordering::SeqCst));
        assert!(cache.get(&video_id).is_none());
        assert!(store.inner.snapshot(video_id).is_none());
    }
}
