//! Video read, counter and owner endpoints.

use crate::auth::{CurrentUser, SessionContext};
use crate::error::{ErrorResponse, HttpAppError, JsonBody};
use crate::services::CounterOutcome;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use vidvault_core::{Video, VideoPrivacy};

#[derive(Debug, Serialize, ToSchema)]
pub struct CounterResponse {
    pub video_id: Uuid,
    pub outcome: CounterOutcome,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPrivacyRequest {
    /// 0 public, 1 organization, 2 unlisted, 3 private
    #[schema(value_type = u8)]
    pub privacy: VideoPrivacy,
}

/// Get a video
#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video", body = Video),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn get_video(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state.videos.service.get_video(id, session.user).await?;
    Ok(Json(video))
}

/// Record a page view. Repeat views from one address within the dedupe window are not counted.
#[utoipa::path(
    post,
    path = "/api/v0/videos/{id}/views",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses((status = 202, description = "View processed", body = CounterResponse))
)]
pub async fn record_view(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let outcome = state
        .videos
        .counters
        .record_view(id, &session.client_ip)
        .await;
    (
        StatusCode::ACCEPTED,
        Json(CounterResponse {
            video_id: id,
            outcome,
        }),
    )
}

/// Record a finished download
#[utoipa::path(
    post,
    path = "/api/v0/videos/{id}/downloads",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses((status = 202, description = "Download processed", body = CounterResponse))
)]
pub async fn record_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let outcome = state.videos.counters.record_download(id).await;
    (
        StatusCode::ACCEPTED,
        Json(CounterResponse {
            video_id: id,
            outcome,
        }),
    )
}

/// Change the privacy of an owned video
#[utoipa::path(
    put,
    path = "/api/v0/videos/{id}/privacy",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body = SetPrivacyRequest,
    responses(
        (status = 200, description = "Privacy updated", body = Video),
        (status = 400, description = "Unknown or non-selectable privacy", body = ErrorResponse),
        (status = 401, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn set_privacy(
    CurrentUser(owner): CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<SetPrivacyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .videos
        .service
        .set_privacy(id, owner, request.privacy)
        .await?;
    Ok(Json(video))
}

/// Delete an owned video with all of its files
#[utoipa::path(
    delete,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 401, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn delete_video(
    CurrentUser(owner): CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.videos.service.delete_video(id, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}
