//! View and download counters.
//!
//! Views are deduplicated per client address for the dedupe window; downloads are
//! counted unconditionally. Failures are logged and reported in the outcome, never
//! surfaced as request errors.

use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use vidvault_db::VideoRecordStore;
use vidvault_infra::ViewDedupeCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CounterOutcome {
    Counted,
    /// A view from this address was already counted in the current window
    Suppressed,
    UnknownVideo,
    Failed,
}

#[derive(Clone)]
pub struct CounterService {
    dedupe: ViewDedupeCache,
    store: Arc<dyn VideoRecordStore>,
}

impl CounterService {
    pub fn new(dedupe: ViewDedupeCache, store: Arc<dyn VideoRecordStore>) -> Self {
        Self { dedupe, store }
    }

    pub async fn record_view(&self, video_id: Uuid, client_address: &str) -> CounterOutcome {
        if !self.dedupe.try_mark(client_address) {
            tracing::debug!(video_id = %video_id, client_ip = %client_address, "View suppressed");
            return CounterOutcome::Suppressed;
        }

        let outcome = match self.store.increment_views(video_id).await {
            Ok(true) => CounterOutcome::Counted,
            Ok(false) => CounterOutcome::UnknownVideo,
            Err(e) => {
                tracing::error!(error = %e, video_id = %video_id, "Failed to record view");
                CounterOutcome::Failed
            }
        };

        if outcome != CounterOutcome::Counted {
            self.dedupe.unmark(client_address);
        }
        outcome
    }

    pub async fn record_download(&self, video_id: Uuid) -> CounterOutcome {
        match self.store.increment_downloads(video_id).await {
            Ok(true) => CounterOutcome::Counted,
            Ok(false) => CounterOutcome::UnknownVideo,
            Err(e) => {
                tracing::error!(error = %e, video_id = %video_id, "Failed to record download");
                CounterOutcome::Failed
            }
        }
    }
}
