// src/handlers/media.rs

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::media::{MediaFile, MediaListParams, UploadParams},
    state::AppState,
};

/// 25 MB, matching the upload limit of typical hosting tiers.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

fn audio_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/ogg" => Some("ogg"),
        _ => None,
    }
}

/// Stores an uploaded audio blob and records it in `media_files`.
/// Admin only. The raw request body is the file content.
pub async fn upload_audio(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .ok_or(AppError::BadRequest("Missing Content-Type".to_string()))?;

    let extension = audio_extension(&content_type).ok_or(AppError::BadRequest(format!(
        "Unsupported audio type '{}'",
        content_type
    )))?;

    if body.is_empty() {
        return Err(AppError::BadRequest("Empty upload".to_string()));
    }
    if body.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("Upload exceeds 25 MB".to_string()));
    }

    let subject = params.subject.as_deref().unwrap_or("general");
    let key = format!(
        "audio/{}/{}_{}.{}",
        subject,
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..8],
        extension
    );

    state.media.put(&key, &body).await?;

    let public_url = format!("{}/{}", state.config.media_base_url, key);

    let file = sqlx::query_as::<_, MediaFile>(
        "INSERT INTO media_files (storage_key, subject, content_type, size_bytes, public_url)
         VALUES (?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&key)
    .bind(subject)
    .bind(&content_type)
    .bind(body.len() as i64)
    .bind(&public_url)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record media file: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(file)))
}

/// Streams a stored blob back under its key, with the content type
/// recorded at upload time. Backs the URLs handed out by `upload_audio`.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT content_type FROM media_files WHERE storage_key = ?")
            .bind(&key)
            .fetch_optional(&state.pool)
            .await?;
    let (content_type,) = row.ok_or(AppError::NotFound("Media file not found".to_string()))?;

    let bytes = state
        .media
        .get(&key)
        .await?
        .ok_or(AppError::NotFound("Media file not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Lists stored media, optionally restricted to one subject.
pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<MediaListParams>,
) -> Result<impl IntoResponse, AppError> {
    let files: Vec<MediaFile> = match &params.subject {
        Some(subject) => {
            sqlx::query_as(
                "SELECT * FROM media_files WHERE subject = ? ORDER BY created_at DESC, id DESC",
            )
            .bind(subject)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM media_files ORDER BY created_at DESC, id DESC")
                .fetch_all(&state.pool)
                .await?
        }
    };

    Ok(Json(files))
}

/// Deletes a media file from both the blob store and the database.
/// Admin only.
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let file: Option<MediaFile> = sqlx::query_as("SELECT * FROM media_files WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    let file = file.ok_or(AppError::NotFound("Media file not found".to_string()))?;

    state.media.delete(&file.storage_key).await?;

    sqlx::query("DELETE FROM media_files WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
