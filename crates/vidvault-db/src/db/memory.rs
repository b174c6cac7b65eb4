//! In-memory `VideoRecordStore` with the same conflict semantics as the Postgres
//! repository. Each operation runs under one lock, mirroring a single statement.

use crate::db::store::{ClaimOutcome, VideoDetails, VideoRecordStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;
use vidvault_core::{AppError, Video, VideoPrivacy};

#[derive(Clone, Default)]
pub struct InMemoryVideoStore {
    videos: Arc<Mutex<HashMap<Uuid, Video>>>,
    claim_calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `claim` calls that reached the store
    pub fn claim_calls(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail with a database error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Insert or replace a row directly
    pub fn insert(&self, video: Video) {
        if let Ok(mut videos) = self.videos.lock() {
            videos.insert(video.id, video);
        }
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.videos.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn videos(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Video>>, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        self.videos
            .lock()
            .map_err(|_| AppError::Internal("video store lock poisoned".to_string()))
    }

    fn upsert(
        &self,
        id: Uuid,
        owner_id: Uuid,
        update: impl FnOnce(&mut Video),
    ) -> Result<ClaimOutcome, AppError> {
        let mut videos = self.videos()?;
        match videos.get_mut(&id) {
            Some(video) if video.owner_id != owner_id => Ok(ClaimOutcome::OwnedByOther),
            Some(video) => {
                update(video);
                Ok(ClaimOutcome::AlreadyOwned)
            }
            None => {
                let now = Utc::now();
                let mut video = Video {
                    id,
                    owner_id,
                    title: None,
                    description: None,
                    duration_secs: None,
                    size_bytes: 0,
                    view_count: 0,
                    download_count: 0,
                    privacy: VideoPrivacy::Processing,
                    created_at: now,
                    updated_at: now,
                };
                update(&mut video);
                videos.insert(id, video);
                Ok(ClaimOutcome::Created)
            }
        }
    }
}

#[async_trait]
impl VideoRecordStore for InMemoryVideoStore {
    async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.videos()?.contains_key(&id))
    }

    async fn owned_by(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .videos()?
            .get(&id)
            .is_some_and(|v| v.owner_id == owner_id))
    }

    async fn claim(&self, id: Uuid, owner_id: Uuid) -> Result<ClaimOutcome, AppError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.upsert(id, owner_id, |_| {})
    }

    async fn apply_metadata(
        &self,
        id: Uuid,
        owner_id: Uuid,
        details: &VideoDetails,
    ) -> Result<ClaimOutcome, AppError> {
        self.upsert(id, owner_id, |video| {
            video.title = Some(details.title.clone());
            video.description = Some(details.description.clone());
            video.duration_secs = Some(details.duration_secs);
            video.updated_at = Utc::now();
        })
    }

    async fn set_privacy(
        &self,
        id: Uuid,
        owner_id: Uuid,
        privacy: VideoPrivacy,
    ) -> Result<bool, AppError> {
        let mut videos = self.videos()?;
        match videos.get_mut(&id) {
            Some(video) if video.owner_id == owner_id => {
                video.privacy = privacy;
                video.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_size(&self, id: Uuid, size_bytes: i64) -> Result<(), AppError> {
        if let Some(video) = self.videos()?.get_mut(&id) {
            video.size_bytes = size_bytes;
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .videos()?
            .get_mut(&id)
            .map(|v| v.view_count += 1)
            .is_some())
    }

    async fn increment_downloads(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .videos()?
            .get_mut(&id)
            .map(|v| v.download_count += 1)
            .is_some())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos()?.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        let mut videos = self.videos()?;
        if videos.get(&id).is_some_and(|v| v.owner_id == owner_id) {
            videos.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
