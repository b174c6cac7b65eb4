use crate::traits::{StagingStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;
use vidvault_core::models::StagedBlob;

/// Local filesystem staging store: `<staging_root>/<video_id>/<transfer_id>`
///
/// Writes to one blob are serialized, so the offset check and the write of a chunk
/// happen as one step even when the same chunk is sent twice at once.
#[derive(Clone)]
pub struct LocalStagingStore {
    base_path: PathBuf,
    blob_locks: Arc<DashMap<StagedBlob, Arc<Mutex<()>>>>,
}

impl LocalStagingStore {
    /// Create a new LocalStagingStore, creating the staging root if needed
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create staging directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStagingStore {
            base_path,
            blob_locks: Arc::new(DashMap::new()),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn video_dir(&self, video_id: Uuid) -> PathBuf {
        self.base_path.join(video_id.to_string())
    }

    fn blob_path(&self, blob: &StagedBlob) -> PathBuf {
        self.video_dir(blob.video_id)
            .join(blob.transfer_id.to_string())
    }

    fn blob_lock(&self, blob: &StagedBlob) -> Arc<Mutex<()>> {
        self.blob_locks.entry(*blob).or_default().clone()
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

async fn staged_size(path: &Path) -> StorageResult<Option<u64>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Copy `source` next to `destination` and rename it over the target, so a failed
/// copy never truncates an already placed file.
async fn copy_into_place(source: &Path, destination: &Path, tag: Uuid) -> StorageResult<()> {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = destination.with_file_name(format!(".{}.{}.partial", file_name, tag));

    let copied = match fs::copy(source, &partial).await {
        Ok(_) => fs::rename(&partial, destination).await,
        Err(e) => Err(e),
    };
    if let Err(e) = copied {
        let _ = fs::remove_file(&partial).await;
        return Err(StorageError::MoveFailed(format!(
            "Failed to move {} to {}: {}",
            source.display(),
            destination.display(),
            e
        )));
    }

    if let Err(e) = fs::remove_file(source).await {
        tracing::warn!(error = %e, path = %source.display(), "Copied blob left in staging");
    }
    Ok(())
}

#[async_trait]
impl StagingStore for LocalStagingStore {
    async fn append(&self, blob: &StagedBlob, offset: u64, data: Bytes) -> StorageResult<u64> {
        let path = self.blob_path(blob);
        let lock = self.blob_lock(blob);
        let _guard = lock.lock().await;

        self.ensure_parent_dir(&path).await?;

        let current = staged_size(&path).await?.unwrap_or(0);
        if current != offset {
            return Err(StorageError::OffsetMismatch {
                expected: current,
                actual: offset,
            });
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to open staged blob {}: {}",
                    path.display(),
                    e
                ))
            })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write staged blob {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to sync staged blob {}: {}",
                path.display(),
                e
            ))
        })?;

        let new_len = current + data.len() as u64;

        tracing::debug!(
            video_id = %blob.video_id,
            transfer_id = %blob.transfer_id,
            offset,
            size_bytes = data.len(),
            new_len,
            "Staged chunk appended"
        );

        Ok(new_len)
    }

    async fn staged_len(&self, blob: &StagedBlob) -> StorageResult<Option<u64>> {
        staged_size(&self.blob_path(blob)).await
    }

    async fn move_to(&self, blob: &StagedBlob, destination: &Path) -> StorageResult<u64> {
        let source = self.blob_path(blob);
        let lock = self.blob_lock(blob);
        let _guard = lock.lock().await;
        let start = std::time::Instant::now();

        if !fs::try_exists(&source).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!(
                "{}/{}",
                blob.video_id, blob.transfer_id
            )));
        }

        self.ensure_parent_dir(destination).await.map_err(|e| {
            StorageError::MoveFailed(format!(
                "Failed to create directory for {}: {}",
                destination.display(),
                e
            ))
        })?;

        // rename replaces an existing destination; copy covers staging on another filesystem
        if let Err(rename_err) = fs::rename(&source, destination).await {
            tracing::debug!(
                error = %rename_err,
                from = %source.display(),
                to = %destination.display(),
                "Rename failed, falling back to copy"
            );
            copy_into_place(&source, destination, blob.transfer_id).await?;
        }

        let size = fs::metadata(destination)
            .await
            .map_err(|e| StorageError::MoveFailed(e.to_string()))?
            .len();

        tracing::info!(
            video_id = %blob.video_id,
            transfer_id = %blob.transfer_id,
            path = %destination.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Staged blob moved into place"
        );

        Ok(size)
    }

    async fn delete(&self, blob: &StagedBlob) -> StorageResult<()> {
        let path = self.blob_path(blob);
        {
            let lock = self.blob_lock(blob);
            let _guard = lock.lock().await;

            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::DeleteFailed(format!(
                        "Failed to delete staged blob {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        self.blob_locks.remove(blob);

        // Drop the per-video directory once its last blob is gone
        let _ = fs::remove_dir(self.video_dir(blob.video_id)).await;

        Ok(())
    }

    async fn discard_video(&self, video_id: Uuid) -> StorageResult<usize> {
        let dir = self.video_dir(video_id);
        self.blob_locks.retain(|blob, _| blob.video_id != video_id);

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            fs::remove_file(entry.path()).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to discard staged blob {}: {}",
                    entry.path().display(),
                    e
                ))
            })?;
            removed += 1;
        }

        fs::remove_dir_all(&dir).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(StorageError::DeleteFailed(format!(
                    "Failed to remove staging directory {}: {}",
                    dir.display(),
                    e
                )))
            }
        })?;

        tracing::info!(video_id = %video_id, removed, "Discarded staged blobs");

        Ok(removed)
    }
}
