use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vidvault_core::{AppError, UserIdentity};

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid, // user_id
    pub exp: i64,  // expiration timestamp
    pub iat: i64,  // issued at timestamp
}

/// Per-request identity placed in request extensions by the session middleware.
///
/// `user` is `None` for anonymous requests; routes decide whether that is acceptable.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user: Option<UserIdentity>,
    pub client_ip: String,
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .unwrap_or_else(|| SessionContext {
                user: None,
                client_ip: "unknown".to_string(),
            }))
    }
}

/// Extractor for routes that require a signed-in user
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserIdentity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .and_then(|ctx| ctx.user)
            .map(CurrentUser)
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Sign-in required".to_string())))
    }
}
