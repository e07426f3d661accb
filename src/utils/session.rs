// src/utils/session.rs

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{cache, state::AppState};

/// Session payload stored in the cache under `session:<token>`.
///
/// Injected into request extensions by `auth_middleware` so handlers can
/// identify the caller without another cache lookup.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    /// User's role (e.g., 'user', 'admin').
    pub role: String,
}

/// Mints a new opaque session token.
pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;
    header.strip_prefix("Bearer ")
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header
/// against the session store. If the token maps to a live session, injects
/// `SessionUser` into the request extensions for handlers to use.
/// If invalid or expired, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let session: SessionUser = state
        .cache
        .get_json(&cache::session_key(token))
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Checks if the injected `SessionUser`
/// has 'admin' role. If not, returns 403 Forbidden.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let session = req
        .extensions()
        .get::<SessionUser>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if session.role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
