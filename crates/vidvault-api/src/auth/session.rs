//! Session lookup: turns request credentials into an optional user identity.

use crate::auth::models::SessionClaims;
use crate::constants::SESSION_COOKIE;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use vidvault_core::{AppError, UserIdentity};

/// Resolves the user behind a request. Missing or invalid credentials resolve to `None`.
pub trait SessionResolver: Send + Sync {
    fn current_user(&self, headers: &HeaderMap) -> Option<UserIdentity>;
}

/// HS256 session tokens from `Authorization: Bearer <token>` or the session cookie
pub struct JwtSessionResolver {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl JwtSessionResolver {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Session has expired".to_string())
                }
                _ => AppError::Unauthorized(format!("Invalid session token: {}", e)),
            })
    }

    /// Issue a token for `user`, valid for `ttl_secs`
    pub fn issue(&self, user: UserIdentity, ttl_secs: i64) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id(),
            iat: now,
            exp: now + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty())
}

impl SessionResolver for JwtSessionResolver {
    fn current_user(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let token = bearer_token(headers).or_else(|| cookie_token(headers))?;
        match self.verify(token) {
            Ok(claims) => Some(UserIdentity::new(claims.sub)),
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                None
            }
        }
    }
}
