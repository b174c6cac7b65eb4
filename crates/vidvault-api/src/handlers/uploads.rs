//! Upload hooks: per-chunk authorization, chunk staging and file completion.
//!
//! Clients pick the video id and a transfer id per file, then send the file body as
//! PATCH requests carrying the current `Upload-Offset`. Every chunk passes the
//! authorization gate; the first chunk of an unseen video id claims it.

use crate::auth::{CurrentUser, SessionContext};
use crate::constants::UPLOAD_OFFSET_HEADER;
use crate::error::{ErrorResponse, HttpAppError, JsonBody};
use crate::services::CompletionRequest;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use vidvault_core::models::StagedBlob;
use vidvault_core::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizeUploadRequest {
    /// Client-assigned video id (UUID)
    pub video_id: String,
    /// Transfer id of the file being sent
    pub transfer_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizeUploadResponse {
    pub video_id: Uuid,
    pub admitted: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteUploadRequest {
    /// Upload file kind: 0 video, 1 meta, 2 tags, 3 chapters, 4 extra, 5 miniature
    pub kind: u8,
    pub video_id: String,
    pub transfer_id: String,
    /// Final file name inside the video directory
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteUploadResponse {
    pub video_id: Uuid,
    pub kind: u8,
    /// Placed file, relative to the media root
    pub file: String,
    pub size_bytes: u64,
    pub thumbnail: bool,
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value)
        .map_err(|_| AppError::InvalidInput(format!("{} must be a UUID", field)))
}

fn upload_offset(headers: &HeaderMap) -> Result<u64, AppError> {
    headers
        .get(UPLOAD_OFFSET_HEADER)
        .ok_or_else(|| AppError::InvalidInput("Missing Upload-Offset header".to_string()))?
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| AppError::InvalidInput("Invalid Upload-Offset header".to_string()))
}

fn offset_header(offset: u64) -> [(HeaderName, String); 1] {
    [(HeaderName::from_static(UPLOAD_OFFSET_HEADER), offset.to_string())]
}

/// Check whether the caller may upload to a video id
#[utoipa::path(
    post,
    path = "/api/v0/uploads/authorize",
    tag = "uploads",
    request_body = AuthorizeUploadRequest,
    responses(
        (status = 200, description = "Upload admitted", body = AuthorizeUploadResponse),
        (status = 400, description = "Malformed video id", body = ErrorResponse),
        (status = 401, description = "No session or video owned by another user", body = ErrorResponse),
        (status = 503, description = "Store unavailable, retry later", body = ErrorResponse)
    )
)]
pub async fn authorize_upload(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<AuthorizeUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .uploads
        .gate
        .authorize(&request.video_id, &request.transfer_id, session.user)
        .await
        .into_result()?;

    Ok(Json(AuthorizeUploadResponse {
        video_id: parse_uuid(&request.video_id, "video_id")?,
        admitted: true,
    }))
}

/// Append one chunk to a staged file
#[utoipa::path(
    patch,
    path = "/api/v0/uploads/{video_id}/{transfer_id}",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("transfer_id" = String, Path, description = "Transfer ID"),
        ("Upload-Offset" = u64, Header, description = "Byte offset of this chunk")
    ),
    request_body(content = Vec<u8>, content_type = "application/offset+octet-stream"),
    responses(
        (status = 204, description = "Chunk staged; Upload-Offset holds the new length"),
        (status = 400, description = "Invalid ids or offset header", body = ErrorResponse),
        (status = 401, description = "Not allowed to upload to this video", body = ErrorResponse),
        (status = 409, description = "Offset does not match staged length", body = ErrorResponse),
        (status = 413, description = "Chunk too large", body = ErrorResponse)
    )
)]
pub async fn upload_chunk(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path((video_id, transfer_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .uploads
        .gate
        .authorize(&video_id, &transfer_id, session.user)
        .await
        .into_result()?;

    let offset = upload_offset(&headers)?;
    if body.len() > state.uploads.max_chunk_size {
        return Err(HttpAppError::from(AppError::PayloadTooLarge(format!(
            "Chunk exceeds maximum of {} bytes",
            state.uploads.max_chunk_size
        ))));
    }

    let blob = StagedBlob::new(
        parse_uuid(&video_id, "video_id")?,
        parse_uuid(&transfer_id, "transfer_id")?,
    );
    let new_len = state.uploads.staging.append(&blob, offset, body).await?;

    Ok((StatusCode::NO_CONTENT, offset_header(new_len)))
}

/// Current staged length of a transfer, for resuming
#[utoipa::path(
    head,
    path = "/api/v0/uploads/{video_id}/{transfer_id}",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("transfer_id" = String, Path, description = "Transfer ID")
    ),
    responses(
        (status = 204, description = "Upload-Offset holds the staged length"),
        (status = 401, description = "Not allowed to upload to this video", body = ErrorResponse)
    )
)]
pub async fn upload_offset_status(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path((video_id, transfer_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .uploads
        .gate
        .authorize(&video_id, &transfer_id, session.user)
        .await
        .into_result()?;

    let blob = StagedBlob::new(
        parse_uuid(&video_id, "video_id")?,
        parse_uuid(&transfer_id, "transfer_id")?,
    );
    let staged = state.uploads.staging.staged_len(&blob).await?.unwrap_or(0);

    Ok((StatusCode::NO_CONTENT, offset_header(staged)))
}

/// Place a fully transferred file
#[utoipa::path(
    post,
    path = "/api/v0/uploads/complete",
    tag = "uploads",
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "File placed", body = CompleteUploadResponse),
        (status = 400, description = "Malformed completion; staged files of the video were discarded", body = ErrorResponse),
        (status = 401, description = "Not allowed to upload to this video", body = ErrorResponse),
        (status = 404, description = "Nothing staged for this transfer", body = ErrorResponse),
        (status = 503, description = "Relocation failed, retry later", body = ErrorResponse)
    )
)]
pub async fn complete_upload(
    CurrentUser(owner): CurrentUser,
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CompleteUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .uploads
        .gate
        .authorize(&request.video_id, &request.transfer_id, Some(owner))
        .await
        .into_result()?;

    let video_id = parse_uuid(&request.video_id, "video_id")?;
    let placed = state
        .uploads
        .router
        .on_file_complete(CompletionRequest {
            kind: request.kind,
            video_id,
            filename: request.filename,
            transfer_id: parse_uuid(&request.transfer_id, "transfer_id")?,
            owner,
        })
        .await?;

    let file = placed
        .path
        .strip_prefix(state.uploads.router.layout().root())
        .unwrap_or(&placed.path)
        .to_string_lossy()
        .into_owned();

    Ok(Json(CompleteUploadResponse {
        video_id,
        kind: placed.kind.into(),
        file,
        size_bytes: placed.size_bytes,
        thumbnail: placed.thumbnail.is_some(),
    }))
}
