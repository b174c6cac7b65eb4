//! On-disk layout of placed media.

use crate::traits::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;
use vidvault_core::models::UploadFileKind;

pub const EXTRA_DIR: &str = "extra";
pub const MINIATURES_DIR: &str = "areaMiniatures";
pub const THUMBNAIL_FILE: &str = "thumb.jpg";

#[derive(Debug, Clone)]
pub struct MediaLayout {
    root: PathBuf,
}

impl MediaLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn video_dir(&self, video_id: Uuid) -> PathBuf {
        self.root.join(video_id.to_string())
    }

    /// Final path of a completed file. `filename` must already be validated as a
    /// single path component.
    pub fn destination(&self, kind: UploadFileKind, video_id: Uuid, filename: &str) -> PathBuf {
        let dir = self.video_dir(video_id);
        match kind {
            UploadFileKind::Video
            | UploadFileKind::Meta
            | UploadFileKind::Tags
            | UploadFileKind::Chapters => dir.join(filename),
            UploadFileKind::Extra => dir.join(EXTRA_DIR).join(filename),
            UploadFileKind::Miniature => dir.join(MINIATURES_DIR).join(filename),
        }
    }

    pub fn thumbnail_path(&self, video_id: Uuid) -> PathBuf {
        self.video_dir(video_id).join(THUMBNAIL_FILE)
    }

    /// Total size in bytes of every file under the video directory.
    /// A missing directory has size zero.
    pub async fn directory_size(&self, video_id: Uuid) -> StorageResult<u64> {
        let mut total = 0u64;
        let mut pending = vec![self.video_dir(video_id)];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    total += entry.metadata().await?.len();
                }
            }
        }

        Ok(total)
    }

    /// Remove the whole video tree. Removing a missing tree is not an error.
    pub async fn remove_video(&self, video_id: Uuid) -> StorageResult<()> {
        let dir = self.video_dir(video_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!(video_id = %video_id, path = %dir.display(), "Removed video tree");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to remove {}: {}",
                dir.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_destination_per_kind() {
        let layout = MediaLayout::new("/srv/media");
        let id = Uuid::nil();
        let base = format!("/srv/media/{}", id);

        for kind in [
            UploadFileKind::Video,
            UploadFileKind::Meta,
            UploadFileKind::Tags,
            UploadFileKind::Chapters,
        ] {
            assert_eq!(
                layout.destination(kind, id, "a.mp4"),
                PathBuf::from(format!("{}/a.mp4", base))
            );
        }
        assert_eq!(
            layout.destination(UploadFileKind::Extra, id, "f.bin"),
            PathBuf::from(format!("{}/extra/f.bin", base))
        );
        assert_eq!(
            layout.destination(UploadFileKind::Miniature, id, "m.png"),
            PathBuf::from(format!("{}/areaMiniatures/m.png", base))
        );
        assert_eq!(
            layout.thumbnail_path(id),
            PathBuf::from(format!("{}/thumb.jpg", base))
        );
    }

    #[tokio::test]
    async fn test_directory_size_is_recursive() {
        let dir = tempdir().unwrap();
        let layout = MediaLayout::new(dir.path());
        let id = Uuid::new_v4();

        assert_eq!(layout.directory_size(id).await.unwrap(), 0);

        let extra = layout.destination(UploadFileKind::Extra, id, "f.bin");
        fs::create_dir_all(extra.parent().unwrap()).await.unwrap();
        fs::write(&extra, b"12345").await.unwrap();
        fs::write(layout.destination(UploadFileKind::Video, id, "v.mp4"), b"abc")
            .await
            .unwrap();

        assert_eq!(layout.directory_size(id).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_remove_video_is_idempotent() {
        let dir = tempdir().unwrap();
        let layout = MediaLayout::new(dir.path());
        let id = Uuid::new_v4();

        let path = layout.destination(UploadFileKind::Miniature, id, "m.png");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"x").await.unwrap();

        layout.remove_video(id).await.unwrap();
        assert!(!layout.video_dir(id).exists());
        layout.remove_video(id).await.unwrap();
    }
}
