//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::services::CounterOutcome;
use vidvault_core::Video;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vidvault API",
        version = "0.1.0",
        description = "Resumable video uploads with per-chunk ownership checks, file placement, view and download counters, and owner actions. Versioned endpoints live under /api/v0/."
    ),
    paths(
        handlers::health::health_check,
        // Uploads
        handlers::uploads::authorize_upload,
        handlers::uploads::upload_chunk,
        handlers::uploads::upload_offset_status,
        handlers::uploads::complete_upload,
        // Videos
        handlers::videos::get_video,
        handlers::videos::record_view,
        handlers::videos::record_download,
        handlers::videos::set_privacy,
        handlers::videos::delete_video,
    ),
    components(
        schemas(
            Video,
            CounterOutcome,
            handlers::health::HealthCheckResponse,
            handlers::uploads::AuthorizeUploadRequest,
            handlers::uploads::AuthorizeUploadResponse,
            handlers::uploads::CompleteUploadRequest,
            handlers::uploads::CompleteUploadResponse,
            handlers::videos::CounterResponse,
            handlers::videos::SetPrivacyRequest,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Chunk authorization, staging and file completion"),
        (name = "videos", description = "Video reads, counters and owner actions"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_upload_and_video_paths() {
        let doc = get_openapi_spec();
        for path in [
            "/health",
            "/api/v0/uploads/authorize",
            "/api/v0/uploads/complete",
            "/api/v0/uploads/{video_id}/{transfer_id}",
            "/api/v0/videos/{id}",
            "/api/v0/videos/{id}/privacy",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
