// src/handlers/english.rs

use std::time::Instant;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    cache,
    error::AppError,
    models::composition::{ComposeRequest, CompositionResponse, CompositionRow},
    sgif::{Correction, ErrorSpan, Suggestion},
    state::AppState,
    utils::session::SessionUser,
};

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Runs a composition through the SGIF backend and stores the result.
///
/// If the backend fails, the request still succeeds with a degraded
/// passthrough result so the student's text is never lost.
pub async fn compose(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Json(payload): Json<ComposeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let started = Instant::now();
    let correction = match state.sgif.correct(&payload.text).await {
        Ok(correction) => correction,
        Err(e) => {
            tracing::warn!("SGIF backend failed, degrading to passthrough: {:?}", e);
            Correction {
                corrected_text: payload.text.clone(),
                error_analysis: Vec::new(),
                suggestions: Vec::new(),
                sgif_category: "S6".to_string(),
                confidence_score: 0.5,
            }
        }
    };
    let processing_time_ms = started.elapsed().as_millis() as i64;

    let error_analysis = serde_json::to_string(&correction.error_analysis)?;
    let suggestions = serde_json::to_string(&correction.suggestions)?;

    let (id, created_at): (i64, String) = sqlx::query_as(
        "INSERT INTO english_compositions
         (user_id, original_text, corrected_text, error_analysis, suggestions,
          sgif_category, confidence_score, processing_time_ms)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id, created_at",
    )
    .bind(session.user_id)
    .bind(&payload.text)
    .bind(&correction.corrected_text)
    .bind(&error_analysis)
    .bind(&suggestions)
    .bind(&correction.sgif_category)
    .bind(correction.confidence_score)
    .bind(processing_time_ms)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store composition: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // The cached profile counts compositions.
    state.cache.delete(&cache::profile_key(session.user_id)).await;

    Ok(Json(CompositionResponse {
        id,
        original_text: payload.text,
        corrected_text: correction.corrected_text,
        error_analysis: correction.error_analysis,
        suggestions: correction.suggestions,
        sgif_category: correction.sgif_category,
        confidence_score: correction.confidence_score,
        processing_time_ms,
        created_at: Some(created_at),
    }))
}

/// Fetches one stored correction. Owners see their own compositions,
/// admins see everything; anything else reads as not found.
pub async fn get_composition(
    State(pool): State<SqlitePool>,
    Extension(session): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<CompositionRow> =
        sqlx::query_as("SELECT * FROM english_compositions WHERE id = ?")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    let row = row.ok_or(AppError::NotFound("Composition not found".to_string()))?;

    if row.user_id != session.user_id && session.role != "admin" {
        return Err(AppError::NotFound("Composition not found".to_string()));
    }

    Ok(Json(decode_row(row)?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Lists the caller's past corrections, newest first.
pub async fn history(
    State(pool): State<SqlitePool>,
    Extension(session): Extension<SessionUser>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let rows: Vec<CompositionRow> = sqlx::query_as(
        "SELECT * FROM english_compositions
         WHERE user_id = ?
         ORDER BY created_at DESC, id DESC
         LIMIT ? OFFSET ?",
    )
    .bind(session.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list compositions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let compositions = rows
        .into_iter()
        .map(decode_row)
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(compositions))
}

fn decode_row(row: CompositionRow) -> Result<CompositionResponse, AppError> {
    let error_analysis: Vec<ErrorSpan> = serde_json::from_str(&row.error_analysis)?;
    let suggestions: Vec<Suggestion> = serde_json::from_str(&row.suggestions)?;

    Ok(CompositionResponse {
        id: row.id,
        original_text: row.original_text,
        corrected_text: row.corrected_text,
        error_analysis,
        suggestions,
        sgif_category: row.sgif_category,
        confidence_score: row.confidence_score,
        processing_time_ms: row.processing_time_ms,
        created_at: Some(row.created_at),
    })
}
