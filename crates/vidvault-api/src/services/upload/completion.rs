//! Placement of finished file transfers.
//!
//! A completed transfer is classified by its declared kind, moved from staging into
//! the video's directory and removed from staging. Metadata files are parsed and
//! applied to the row, video files get a thumbnail, and the directory size is
//! recomputed after every placement.

use crate::error::storage_error_to_app_error;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use vidvault_core::models::StagedBlob;
use vidvault_core::validation::validate_final_filename;
use vidvault_core::{parse_video_metadata, AppError, UploadFileKind, UserIdentity};
use vidvault_db::{ClaimOutcome, VideoDetails, VideoRecordStore};
use vidvault_processing::ThumbnailExtractor;
use vidvault_storage::{MediaLayout, StagingStore, StorageError};

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Declared `UploadFileKind` ordinal, validated here
    pub kind: u8,
    pub video_id: Uuid,
    pub filename: Option<String>,
    pub transfer_id: Uuid,
    pub owner: UserIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFile {
    pub kind: UploadFileKind,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub thumbnail: Option<PathBuf>,
}

#[derive(Clone)]
pub struct CompletionRouter {
    staging: Arc<dyn StagingStore>,
    layout: MediaLayout,
    store: Arc<dyn VideoRecordStore>,
    thumbnails: Arc<dyn ThumbnailExtractor>,
}

impl CompletionRouter {
    pub fn new(
        staging: Arc<dyn StagingStore>,
        layout: MediaLayout,
        store: Arc<dyn VideoRecordStore>,
        thumbnails: Arc<dyn ThumbnailExtractor>,
    ) -> Self {
        Self {
            staging,
            layout,
            store,
            thumbnails,
        }
    }

    pub fn layout(&self) -> &MediaLayout {
        &self.layout
    }

    pub async fn on_file_complete(&self, request: CompletionRequest) -> Result<PlacedFile, AppError> {
        let video_id = request.video_id;
        let blob = StagedBlob::new(video_id, request.transfer_id);

        let kind = match UploadFileKind::try_from(request.kind) {
            Ok(kind) => kind,
            Err(reason) => return Err(self.abort(video_id, reason).await),
        };
        let filename = match validate_final_filename(request.filename.as_deref()) {
            Ok(name) => name.to_string(),
            Err(reason) => return Err(self.abort(video_id, reason).await),
        };

        let destination = self.layout.destination(kind, video_id, &filename);
        let size_bytes = self
            .staging
            .move_to(&blob, &destination)
            .await
            .map_err(|e| match e {
                e @ StorageError::NotFound(_) => storage_error_to_app_error(e),
                other => {
                    tracing::error!(
                        error = %other,
                        video_id = %video_id,
                        transfer_id = %request.transfer_id,
                        "Relocation failed, staged blob kept"
                    );
                    AppError::RelocationFailed(other.to_string())
                }
            })?;

        if let Err(e) = self.staging.delete(&blob).await {
            tracing::warn!(
                error = %e,
                video_id = %video_id,
                transfer_id = %request.transfer_id,
                "Failed to remove staged blob after placement"
            );
        }

        tracing::info!(
            video_id = %video_id,
            transfer_id = %request.transfer_id,
            kind = %kind,
            path = %destination.display(),
            size_bytes = size_bytes,
            "File placed"
        );

        let mut thumbnail = None;
        match kind {
            UploadFileKind::Meta => self.apply_metadata(video_id, request.owner, &destination).await?,
            UploadFileKind::Video => {
                thumbnail = self.extract_thumbnail(video_id, &destination).await;
            }
            _ => {}
        }

        self.refresh_size(video_id).await;

        Ok(PlacedFile {
            kind,
            path: destination,
            size_bytes,
            thumbnail,
        })
    }

    /// Discard everything staged for the video and build the malformed-completion error
    async fn abort(&self, video_id: Uuid, reason: String) -> AppError {
        match self.staging.discard_video(video_id).await {
            Ok(removed) => tracing::warn!(
                video_id = %video_id,
                removed = removed,
                reason = %reason,
                "Malformed completion, upload aborted"
            ),
            Err(e) => tracing::error!(
                error = %e,
                video_id = %video_id,
                reason = %reason,
                "Malformed completion, failed to discard staged blobs"
            ),
        }
        AppError::MalformedCompletion(reason)
    }

    async fn apply_metadata(
        &self,
        video_id: Uuid,
        owner: UserIdentity,
        path: &std::path::Path,
    ) -> Result<(), AppError> {
        let text = tokio::fs::read_to_string(path).await?;
        let metadata = parse_video_metadata(&text)?;
        if metadata.id != video_id.to_string() {
            tracing::debug!(
                video_id = %video_id,
                declared_id = %metadata.id,
                "Metadata file declares a different video id"
            );
        }

        let details = VideoDetails {
            title: metadata.title,
            description: metadata.description,
            duration_secs: metadata.duration_secs,
        };
        match self.store.apply_metadata(video_id, owner.id(), &details).await? {
            ClaimOutcome::OwnedByOther => Err(AppError::Unauthorized(
                "Video belongs to another user".to_string(),
            )),
            _ => {
                tracing::info!(video_id = %video_id, "Video metadata applied");
                Ok(())
            }
        }
    }

    async fn extract_thumbnail(&self, video_id: Uuid, video_path: &std::path::Path) -> Option<PathBuf> {
        let output = self.layout.thumbnail_path(video_id);
        match self.thumbnails.extract(video_path, &output).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, video_id = %video_id, "Thumbnail extraction failed");
                None
            }
        }
    }

    async fn refresh_size(&self, video_id: Uuid) {
        let size = match self.layout.directory_size(video_id).await {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(error = %e, video_id = %video_id, "Failed to measure video directory");
                return;
            }
        };
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        if let Err(e) = self.store.set_size(video_id, size).await {
            tracing::warn!(error = %e, video_id = %video_id, "Failed to record video size");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;
    use tempfile::TempDir;
    use vidvault_db::InMemoryVideoStore;
    use vidvault_storage::LocalStagingStore;

    struct CopyThumbnailer;

    #[async_trait]
    impl ThumbnailExtractor for CopyThumbnailer {
        async fn extract(&self, _video_path: &Path, output_path: &Path) -> anyhow::Result<PathBuf> {
            tokio::fs::write(output_path, b"jpeg").await?;
            Ok(output_path.to_path_buf())
        }
    }

    struct FailingThumbnailer;

    #[async_trait]
    impl ThumbnailExtractor for FailingThumbnailer {
        async fn extract(&self, _video_path: &Path, _output_path: &Path) -> anyhow::Result<PathBuf> {
            Err(anyhow!("ffmpeg exited with status 1"))
        }
    }

    struct Fixture {
        _media: TempDir,
        _staging: TempDir,
        staging: Arc<LocalStagingStore>,
        store: InMemoryVideoStore,
        router: CompletionRouter,
        owner: UserIdentity,
    }

    async fn fixture(thumbnails: Arc<dyn ThumbnailExtractor>) -> Fixture {
        let media = TempDir::new().unwrap();
        let staging_dir = TempDir::new().unwrap();
        let staging = Arc::new(LocalStagingStore::new(staging_dir.path()).await.unwrap());
        let store = InMemoryVideoStore::new();
        let router = CompletionRouter::new(
            staging.clone(),
            MediaLayout::new(media.path()),
            Arc::new(store.clone()),
            thumbnails,
        );
        Fixture {
            _media: media,
            _staging: staging_dir,
            staging,
            store,
            router,
            owner: UserIdentity::new(Uuid::new_v4()),
        }
    }

    async fn stage(f: &Fixture, video_id: Uuid, data: &'static [u8]) -> StagedBlob {
        let blob = StagedBlob::new(video_id, Uuid::new_v4());
        f.staging
            .append(&blob, 0, Bytes::from_static(data))
            .await
            .unwrap();
        blob
    }

    fn request(f: &Fixture, kind: UploadFileKind, blob: StagedBlob, name: &str) -> CompletionRequest {
        CompletionRequest {
            kind: kind.into(),
            video_id: blob.video_id,
            filename: Some(name.to_string()),
            transfer_id: blob.transfer_id,
            owner: f.owner,
        }
    }

    #[tokio::test]
    async fn test_extra_file_is_placed_and_overwritten() {
        let f = fixture(Arc::new(FailingThumbnailer)).await;
        let video_id = Uuid::new_v4();
        f.store.claim(video_id, f.owner.id()).await.unwrap();

        let blob = stage(&f, video_id, b"first").await;
        let placed = f
            .router
            .on_file_complete(request(&f, UploadFileKind::Extra, blob, "f.bin"))
            .await
            .unwrap();

        let expected = f.router.layout().video_dir(video_id).join("extra").join("f.bin");
        assert_eq!(placed.path, expected);
        assert_eq!(tokio::fs::read(&expected).await.unwrap(), b"first");
        assert!(!f.staging.exists(&blob).await.unwrap());

        let blob = stage(&f, video_id, b"second!").await;
        f.router
            .on_file_complete(request(&f, UploadFileKind::Extra, blob, "f.bin"))
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&expected).await.unwrap(), b"second!");
        assert_eq!(f.store.snapshot(video_id).unwrap().size_bytes, 7);
    }

    #[tokio::test]
    async fn test_empty_filename_aborts_upload() {
        let f = fixture(Arc::new(FailingThumbnailer)).await;
        let video_id = Uuid::new_v4();
        let blob = stage(&f, video_id, b"data").await;
        let other = stage(&f, video_id, b"more").await;

        let mut req = request(&f, UploadFileKind::Video, blob, "");
        let err = f.router.on_file_complete(req.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedCompletion(_)));

        req.filename = None;
        let err = f.router.on_file_complete(req).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedCompletion(_)));

        assert!(!f.staging.exists(&blob).await.unwrap());
        assert!(!f.staging.exists(&other).await.unwrap());
        assert!(!f.router.layout().video_dir(video_id).exists());
    }

    #[tokio::test]
    async fn test_unknown_kind_aborts_upload() {
        let f = fixture(Arc::new(FailingThumbnailer)).await;
        let video_id = Uuid::new_v4();
        let blob = stage(&f, video_id, b"data").await;

        let mut req = request(&f, UploadFileKind::Video, blob, "clip.mp4");
        req.kind = 42;
        let err = f.router.on_file_complete(req).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedCompletion(_)));
        assert!(!f.staging.exists(&blob).await.unwrap());
    }

    #[tokio::test]
    async fn test_metadata_file_updates_row() {
        let f = fixture(Arc::new(FailingThumbnailer)).await;
        let video_id = Uuid::new_v4();
        f.store.claim(video_id, f.owner.id()).await.unwrap();

        let text = format!(
            "vidvault metadata\nid:{}\ntitle:T\ndescription:D\nlength:120\n",
            video_id
        );
        let blob = StagedBlob::new(video_id, Uuid::new_v4());
        f.staging
            .append(&blob, 0, Bytes::from(text.into_bytes()))
            .await
            .unwrap();

        f.router
            .on_file_complete(request(&f, UploadFileKind::Meta, blob, "meta.txt"))
            .await
            .unwrap();

        let video = f.store.snapshot(video_id).unwrap();
        assert_eq!(video.title.as_deref(), Some("T"));
        assert_eq!(video.description.as_deref(), Some("D"));
        assert_eq!(video.duration_secs, Some(120));
        assert_eq!(video.owner_id, f.owner.id());
        assert_eq!(video.id, video_id);
        assert_eq!(video.privacy, vidvault_core::VideoPrivacy::Processing);
    }

    #[tokio::test]
    async fn test_video_placement_extracts_thumbnail() {
        let f = fixture(Arc::new(CopyThumbnailer)).await;
        let video_id = Uuid::new_v4();
        f.store.claim(video_id, f.owner.id()).await.unwrap();
        let blob = stage(&f, video_id, b"video").await;

        let placed = f
            .router
            .on_file_complete(request(&f, UploadFileKind::Video, blob, "clip.mp4"))
            .await
            .unwrap();

        let thumb = f.router.layout().thumbnail_path(video_id);
        assert_eq!(placed.thumbnail, Some(thumb.clone()));
        assert!(thumb.exists());
        // clip.mp4 + thumb.jpg
        assert_eq!(f.store.snapshot(video_id).unwrap().size_bytes, 9);
    }

    #[tokio::test]
    async fn test_thumbnail_failure_does_not_fail_placement() {
        let f = fixture(Arc::new(FailingThumbnailer)).await;
        let video_id = Uuid::new_v4();
        let blob = stage(&f, video_id, b"video").await;

        let placed = f
            .router
            .on_file_complete(request(&f, UploadFileKind::Video, blob, "clip.mp4"))
            .await
            .unwrap();
        assert!(placed.thumbnail.is_none());
        assert!(placed.path.exists());
    }

    #[tokio::test]
    async fn test_missing_staged_blob_is_not_found() {
        let f = fixture(Arc::new(FailingThumbnailer)).await;
        let blob = StagedBlob::new(Uuid::new_v4(), Uuid::new_v4());
        let err = f
            .router
            .on_file_complete(request(&f, UploadFileKind::Tags, blob, "tags.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
