//! Session-cookie authentication.
//!
//! The cookie carries an opaque random token; the store only keeps its
//! SHA-256 hex digest. Login itself happens elsewhere, this module resolves
//! a request's session to a user.

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::repositories::{SessionRepository, UserRepository};
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// SHA-256 hex digest of a session token
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Fresh random session token (64 hex characters)
pub fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Value of cookie `name` in a `Cookie` header
pub fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

/// Session token from the cookie, falling back to a bearer token
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|h| parse_cookie(h, cookie_name));
    if let Some(token) = from_cookie {
        return Some(token.to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Store a new session for `user_id` and return the raw token
pub async fn issue_session(
    sessions: &SessionRepository,
    user_id: &str,
    ttl: Duration,
) -> AppResult<String> {
    let token = new_session_token();
    sessions
        .create(user_id, &hash_session_token(&token), Utc::now() + ttl)
        .await?;
    Ok(token)
}

/// Resolve a raw session token to its user
pub async fn authenticate(
    sessions: &SessionRepository,
    users: &UserRepository,
    token: &str,
    now: DateTime<Utc>,
) -> AppResult<User> {
    let session = sessions
        .find_by_token_hash(&hash_session_token(token))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid session".into()))?;

    if session.is_expired(now) {
        debug!("Session {} expired at {}", session.id, session.expires_at);
        return Err(AppError::Unauthorized("Session expired".into()));
    }

    users
        .find_by_id(&session.user_id)
        .await?
        .ok_or_else(|| {
            warn!("Session {} points at missing user {}", session.id, session.user_id);
            AppError::Unauthorized("Invalid session".into())
        })
}

/// Any signed-in user
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// A signed-in reviewer or admin
#[derive(Debug, Clone)]
pub struct ReviewerUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.session_cookie)
            .ok_or_else(|| AppError::Unauthorized("Not signed in".into()))?;
        let user = authenticate(&state.session_repo, &state.user_repo, &token, Utc::now()).await?;
        Ok(AuthUser(user))
    }
}

impl FromRequestParts<Arc<AppState>> for ReviewerUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_reviewer() {
            return Err(AppError::Forbidden("Reviewer access required".into()));
        }
        Ok(ReviewerUser(user))
    }
}
