use async_trait::async_trait;
use uuid::Uuid;
use vidvault_core::{AppError, Video, VideoPrivacy};

/// Result of an ownership-checked upsert on a video row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// No row existed; one was created for the caller in `Processing`
    Created,
    /// The row exists and belongs to the caller
    AlreadyOwned,
    /// The row exists and belongs to someone else; nothing was written
    OwnedByOther,
}

impl ClaimOutcome {
    pub fn is_owner(self) -> bool {
        !matches!(self, ClaimOutcome::OwnedByOther)
    }
}

/// Descriptive fields carried by a metadata file. Always applied as a full set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetails {
    pub title: String,
    pub description: String,
    pub duration_secs: i64,
}

/// Contract over the relational store of video rows.
///
/// Every mutation is a single statement; the database is the only serialization
/// point for conflicting writes.
#[async_trait]
pub trait VideoRecordStore: Send + Sync {
    async fn exists(&self, id: Uuid) -> Result<bool, AppError>;

    async fn owned_by(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError>;

    /// Insert a `Processing` row owned by `owner_id`, or keep the existing row.
    /// Reports whether the row is (now) owned by `owner_id`.
    async fn claim(&self, id: Uuid, owner_id: Uuid) -> Result<ClaimOutcome, AppError>;

    /// Idempotent upsert of the descriptive fields under `owner_id`.
    /// Rows owned by someone else are left untouched. Privacy is never changed.
    async fn apply_metadata(
        &self,
        id: Uuid,
        owner_id: Uuid,
        details: &VideoDetails,
    ) -> Result<ClaimOutcome, AppError>;

    /// Returns `false` when no row with that id is owned by `owner_id`
    async fn set_privacy(
        &self,
        id: Uuid,
        owner_id: Uuid,
        privacy: VideoPrivacy,
    ) -> Result<bool, AppError>;

    async fn set_size(&self, id: Uuid, size_bytes: i64) -> Result<(), AppError>;

    /// Returns `false` when the video does not exist
    async fn increment_views(&self, id: Uuid) -> Result<bool, AppError>;

    /// Returns `false` when the video does not exist
    async fn increment_downloads(&self, id: Uuid) -> Result<bool, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Returns `false` when no row with that id is owned by `owner_id`
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError>;
}
