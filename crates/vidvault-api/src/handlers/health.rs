use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;
use vidvault_core::models::StagedBlob;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    /// `healthy` unless the database check failed
    pub status: String,
    pub database: String,
    /// A failing staging check only degrades the service
    pub staging: String,
}

async fn check_dependency<T, E, F>(name: &str, check: F) -> Result<(), String>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(PROBE_TIMEOUT, check).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => {
            tracing::warn!(dependency = name, error = %e, "Health check failed");
            Err(format!("unhealthy: {}", e))
        }
        Err(_) => {
            tracing::warn!(dependency = name, "Health check timed out");
            Err("timeout".to_string())
        }
    }
}

/// Health check: store round-trip and staging root access
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthCheckResponse),
        (status = 503, description = "Service unhealthy", body = HealthCheckResponse)
    )
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthCheckResponse>) {
    let staged = StagedBlob::new(Uuid::nil(), Uuid::nil());
    let (database, staging) = tokio::join!(
        check_dependency("database", state.store.exists(Uuid::nil())),
        check_dependency("staging", state.uploads.staging.staged_len(&staged)),
    );

    let status = if database.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let healthy = || "healthy".to_string();
    let response = HealthCheckResponse {
        status: if database.is_ok() { healthy() } else { "unhealthy".to_string() },
        database: database.err().unwrap_or_else(healthy),
        staging: staging
            .map_err(|e| e.replacen("unhealthy", "degraded", 1))
            .err()
            .unwrap_or_else(healthy),
    };

    (status, Json(response))
}
