//! Shared handler state.
//!
//! Handlers extract the slice they need (`State<UploadState>`, `State<VideoState>`, ...)
//! through `FromRef` on `Arc<AppState>`.

use crate::auth::SessionState;
use crate::services::{AuthorizationGate, CompletionRouter, CounterService, VideoService};
use axum::extract::FromRef;
use std::sync::Arc;
use vidvault_db::VideoRecordStore;
use vidvault_storage::StagingStore;

/// Chunk intake and completion routing
#[derive(Clone)]
pub struct UploadState {
    pub gate: AuthorizationGate,
    pub router: CompletionRouter,
    pub staging: Arc<dyn StagingStore>,
    /// Largest accepted chunk body
    pub max_chunk_size: usize,
}

#[derive(Clone)]
pub struct VideoState {
    pub service: VideoService,
    pub counters: CounterService,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub session: Arc<SessionState>,
    pub cors_origins: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadState,
    pub videos: VideoState,
    pub security: SecurityConfig,
    /// Direct store access for the health check
    pub store: Arc<dyn VideoRecordStore>,
}

macro_rules! sub_state {
    ($ty:ty, $field:ident) => {
        impl FromRef<Arc<AppState>> for $ty {
            fn from_ref(state: &Arc<AppState>) -> Self {
                state.$field.clone()
            }
        }
    };
}

sub_state!(UploadState, uploads);
sub_state!(VideoState, videos);
sub_state!(SecurityConfig, security);

const _: () = {
    const fn shareable<T: Send + Sync>() {}
    shareable::<AppState>();
};
