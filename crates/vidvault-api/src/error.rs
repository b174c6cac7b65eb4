//! Rendering of `AppError` as HTTP responses.
//!
//! Handlers return `Result<_, HttpAppError>`; anything convertible into `AppError`
//! (storage errors, `anyhow`) flows through `?`.

use std::sync::OnceLock;

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;
use vidvault_core::{AppError, ErrorMetadata, LogLevel};
use vidvault_storage::StorageError;

/// JSON body of every failed request
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// e.g. `CONFLICT`, `MALFORMED_COMPLETION`
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(err: &AppError, with_details: bool) -> Self {
        let with_details = with_details && !err.is_sensitive();
        Self {
            error: err.client_message(),
            details: with_details.then(|| err.detailed_message()),
            error_type: with_details.then(|| err.error_type().to_string()),
            code: err.error_code().to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action().map(str::to_string),
        }
    }
}

#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(err.into())
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(storage_error_to_app_error(err))
    }
}

/// Map staging failures onto the status a chunk or completion client should see
pub fn storage_error_to_app_error(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(what) => AppError::NotFound(format!("No staged upload for {}", what)),
        StorageError::OffsetMismatch { expected, actual } => AppError::Conflict(format!(
            "Upload offset {} does not match staged length {}",
            actual, expected
        )),
        StorageError::MoveFailed(msg) => AppError::RelocationFailed(msg),
        other => AppError::Storage(other.to_string()),
    }
}

/// `Json<T>` whose rejection renders as an `ErrorResponse`
#[derive(Debug, Clone, Copy)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(body)) => Ok(JsonBody(body)),
            Err(rejection) => Err(HttpAppError(AppError::InvalidInput(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))),
        }
    }
}

static EXPOSE_DETAILS: OnceLock<bool> = OnceLock::new();

/// Decide once whether non-sensitive error details go into response bodies.
/// Later calls are ignored.
pub fn expose_error_details(enabled: bool) {
    let _ = EXPOSE_DETAILS.set(enabled);
}

fn details_exposed() -> bool {
    *EXPOSE_DETAILS.get_or_init(|| {
        !std::env::var("ENVIRONMENT")
            .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
            .unwrap_or(false)
    })
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let kind = err.error_type();
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(error = %err, error_type = kind, "Request failed"),
            LogLevel::Warn => tracing::warn!(error = %err, error_type = kind, "Request failed"),
            LogLevel::Error => tracing::error!(error = ?err, error_type = kind, "Request failed"),
        }

        let status =
            StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from_app_error(&err, details_exposed());
        (status, Json(body)).into_response()
    }
}
