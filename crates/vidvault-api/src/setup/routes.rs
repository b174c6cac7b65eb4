//! Route configuration and setup

use crate::auth::session_middleware;
use crate::constants::{API_PREFIX, UPLOAD_OFFSET_HEADER};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::{get, patch, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use vidvault_core::Config;

/// Floor for request bodies when the chunk limit is configured very low
const MIN_BODY_LIMIT: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let cors = setup_cors(&state.security.cors_origins);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let body_limit = config.max_chunk_size_bytes.max(MIN_BODY_LIMIT);

    Router::new()
        .merge(public_routes())
        .nest(API_PREFIX, api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.security.session.clone(),
            session_middleware,
        ))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/uploads/authorize",
            post(handlers::uploads::authorize_upload),
        )
        .route("/uploads/complete", post(handlers::uploads::complete_upload))
        .route(
            "/uploads/{video_id}/{transfer_id}",
            patch(handlers::uploads::upload_chunk).head(handlers::uploads::upload_offset_status),
        )
        .route(
            "/videos/{id}",
            get(handlers::videos::get_video).delete(handlers::videos::delete_video),
        )
        .route("/videos/{id}/privacy", put(handlers::videos::set_privacy))
        .route("/videos/{id}/views", post(handlers::videos::record_view))
        .route(
            "/videos/{id}/downloads",
            post(handlers::videos::record_download),
        )
}

/// Setup CORS configuration
fn setup_cors(cors_origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let base = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(UPLOAD_OFFSET_HEADER)]);

    if cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        base.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        base.allow_origin(origins)
    }
}
