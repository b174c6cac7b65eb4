//! Staging store abstraction
//!
//! This module defines the StagingStore trait that holds transfer blobs until they
//! are placed into the media tree.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;
use vidvault_core::models::StagedBlob;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Move failed: {0}")]
    MoveFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Offset mismatch: expected {expected}, got {actual}")]
    OffsetMismatch { expected: u64, actual: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Staging store trait
///
/// Blobs are addressed by `(video_id, transfer_id)`. A blob leaves the store either by
/// `move_to` followed by `delete`, or in bulk through `discard_video`.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Append `data` at `offset` and return the new blob length.
    ///
    /// `offset` must equal the current length of the blob (zero for a new blob).
    async fn append(&self, blob: &StagedBlob, offset: u64, data: Bytes) -> StorageResult<u64>;

    /// Current length of a blob, or `None` when nothing is staged under it
    async fn staged_len(&self, blob: &StagedBlob) -> StorageResult<Option<u64>>;

    async fn exists(&self, blob: &StagedBlob) -> StorageResult<bool> {
        Ok(self.staged_len(blob).await?.is_some())
    }

    /// Move the blob to `destination`, creating missing directories and replacing
    /// an existing file. Returns the number of bytes placed.
    ///
    /// On success the staged blob is gone; `delete` afterwards only drops bookkeeping.
    async fn move_to(&self, blob: &StagedBlob, destination: &Path) -> StorageResult<u64>;

    /// Remove a staged blob. Removing a missing blob is not an error.
    async fn delete(&self, blob: &StagedBlob) -> StorageResult<()>;

    /// Remove every blob staged for a video and return how many were removed
    async fn discard_video(&self, video_id: Uuid) -> StorageResult<usize>;
}
