use std::time::Duration;

use moka::sync::Cache;
use uuid::Uuid;
use vidvault_core::UserIdentity;

/// Memoized upload authorizations: video id to the identity allowed to keep writing.
///
/// Expiry is sliding. Every hit restarts the window, so an upload that keeps sending
/// chunks never falls back to the database mid-transfer.
#[derive(Clone)]
pub struct AuthorizationCache {
    cache: Cache<Uuid, UserIdentity>,
    ttl: Duration,
}

impl AuthorizationCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(ttl)
            .build();
        Self { cache, ttl }
    }

    /// Look up the authorized identity for a video, refreshing its expiry on a hit
    pub fn get(&self, video_id: &Uuid) -> Option<UserIdentity> {
        self.cache.get(video_id)
    }

    /// Record (or refresh) an admitted identity for a video
    pub fn put(&self, video_id: Uuid, identity: UserIdentity) {
        self.cache.insert(video_id, identity);
    }

    pub fn invalidate(&self, video_id: &Uuid) {
        self.cache.invalidate(video_id);
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for AuthorizationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
