// src/handlers/auth.rs

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache,
    error::AppError,
    models::user::{ChallengeRequest, LoginRequest, ProfileResponse, RegisterRequest, User},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        session::{SessionUser, new_session_token},
    },
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, login_count, last_login, created_at";

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password hash).
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users_v2 (username, email, password_hash)
         VALUES (?, ?, ?)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&hashed_password)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            AppError::Conflict("Username or email already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and opens a session.
///
/// Verifies the password, mints an opaque token, and stores the session
/// in the cache under `session:<token>` with the configured TTL.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users_v2 WHERE username = ?"
    ))
    .bind(&payload.username)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::AuthError("User not found".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let token = new_session_token();
    let session = SessionUser {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
    };
    state
        .cache
        .put_json(
            &cache::session_key(&token),
            &session,
            Some(Duration::from_secs(state.config.session_ttl_secs)),
        )
        .await?;

    sqlx::query(
        "UPDATE users_v2
         SET last_login = datetime('now'), login_count = login_count + 1
         WHERE id = ?",
    )
    .bind(user.id)
    .execute(&state.pool)
    .await?;

    // Profile cache is stale after the login counters changed.
    state.cache.delete(&cache::profile_key(user.id)).await;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "role": user.role,
            "login_count": user.login_count + 1,
        }
    })))
}

/// Ends the current session by removing it from the cache.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::AuthError("Missing bearer token".to_string()))?;

    state.cache.delete(&cache::session_key(token)).await;
    state.cache.delete(&cache::profile_key(session.user_id)).await;

    Ok(Json(json!({ "message": "Logged out" })))
}

/// Returns the profile of the current user, cached under
/// `user:profile:<id>`.
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
) -> Result<impl IntoResponse, AppError> {
    let key = cache::profile_key(session.user_id);

    if let Some(profile) = state.cache.get_json::<ProfileResponse>(&key).await {
        return Ok(Json(profile));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users_v2 WHERE id = ?"
    ))
    .bind(session.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let (compositions_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM english_compositions WHERE user_id = ?")
            .bind(session.user_id)
            .fetch_one(&state.pool)
            .await?;

    let (ratings_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ratings WHERE user_id = ?")
            .bind(session.user_id)
            .fetch_one(&state.pool)
            .await?;

    let profile = ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        login_count: user.login_count,
        last_login: user.last_login,
        created_at: user.created_at,
        compositions_count,
        ratings_count,
    };

    state
        .cache
        .put_json(
            &key,
            &profile,
            Some(Duration::from_secs(state.config.cache_ttl_secs)),
        )
        .await?;

    Ok(Json(profile))
}

/// Issues a WebAuthn-style challenge, persisted with a short expiry.
///
/// Attestation itself happens against an external authenticator flow;
/// this endpoint only manages the challenge lifecycle.
pub async fn issue_challenge(
    State(pool): State<SqlitePool>,
    Json(payload): Json<ChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let purpose = payload.purpose.as_deref().unwrap_or("registration");
    if purpose != "registration" && purpose != "authentication" {
        return Err(AppError::BadRequest(format!(
            "Unknown challenge purpose '{}'",
            purpose
        )));
    }

    let challenge = Uuid::new_v4().simple().to_string();

    sqlx::query(
        "INSERT INTO webauthn_challenges_v2 (challenge, username, purpose, expires_at)
         VALUES (?, ?, ?, datetime('now', '+5 minutes'))",
    )
    .bind(&challenge)
    .bind(&payload.username)
    .bind(purpose)
    .execute(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "challenge": challenge,
            "purpose": purpose,
            "expires_in": 300,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyChallengeRequest {
    pub challenge: String,
}

/// Consumes a previously issued challenge. A challenge can be used once
/// and only before its expiry.
pub async fn verify_challenge(
    State(pool): State<SqlitePool>,
    Json(payload): Json<VerifyChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<(bool, bool)> = sqlx::query_as(
        "SELECT used, expires_at <= datetime('now')
         FROM webauthn_challenges_v2 WHERE challenge = ?",
    )
    .bind(&payload.challenge)
    .fetch_optional(&pool)
    .await?;

    let (used, expired) = row.ok_or(AppError::NotFound("Challenge not found".to_string()))?;

    if used {
        return Err(AppError::Conflict("Challenge already used".to_string()));
    }
    if expired {
        return Err(AppError::BadRequest("Challenge expired".to_string()));
    }

    sqlx::query("UPDATE webauthn_challenges_v2 SET used = 1 WHERE challenge = ?")
        .bind(&payload.challenge)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "verified": true })))
}
