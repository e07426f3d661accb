// src/handlers/ratings.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    cache,
    error::AppError,
    models::rating::{RatingEntry, RatingListResponse, RatingStats, SubmitRatingRequest},
    state::AppState,
    utils::{sanitize::clean_rich_text, session::SessionUser},
};

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Submits a rating (1 to 5 stars, optional comment) for a question.
///
/// One rating per (question, user); submitting again replaces the
/// previous one.
pub async fn submit_rating(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Path(question_id): Path<i64>,
    Json(payload): Json<SubmitRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exists: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM questions WHERE id = ? AND active = 1 AND is_deleted = 0",
    )
    .bind(question_id)
    .fetch_optional(&state.pool)
    .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let comment = payload.comment.as_deref().map(clean_rich_text);

    sqlx::query(
        "INSERT INTO ratings (question_id, user_id, rating, comment)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(question_id, user_id) DO UPDATE SET
             rating = excluded.rating,
             comment = excluded.comment,
             created_at = datetime('now')",
    )
    .bind(question_id)
    .bind(session.user_id)
    .bind(payload.rating)
    .bind(comment)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to submit rating: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // The cached profile counts ratings.
    state.cache.delete(&cache::profile_key(session.user_id)).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "question_id": question_id, "rating": payload.rating })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RatingListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Lists a question's ratings together with aggregate statistics.
pub async fn list_ratings(
    State(pool): State<SqlitePool>,
    Path(question_id): Path<i64>,
    Query(params): Query<RatingListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let (total_count, average_rating): (i64, Option<f64>) = sqlx::query_as(
        "SELECT COUNT(*), AVG(rating) FROM ratings WHERE question_id = ?",
    )
    .bind(question_id)
    .fetch_one(&pool)
    .await?;

    let buckets: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT rating, COUNT(*) FROM ratings WHERE question_id = ? GROUP BY rating",
    )
    .bind(question_id)
    .fetch_all(&pool)
    .await?;

    let mut distribution = [0i64; 5];
    for (stars, count) in buckets {
        if (1..=5).contains(&stars) {
            distribution[(stars - 1) as usize] = count;
        }
    }

    // Fetch one extra row to decide whether another page exists.
    let mut ratings: Vec<RatingEntry> = sqlx::query_as(
        "SELECT r.id, r.user_id, u.username, r.rating, r.comment, r.created_at
         FROM ratings r
         JOIN users_v2 u ON u.id = r.user_id
         WHERE r.question_id = ?
         ORDER BY r.created_at DESC, r.id DESC
         LIMIT ? OFFSET ?",
    )
    .bind(question_id)
    .bind(limit + 1)
    .bind(offset)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list ratings: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let has_more = ratings.len() as i64 > limit;
    ratings.truncate(limit as usize);

    Ok(Json(RatingListResponse {
        stats: RatingStats {
            average_rating: average_rating.unwrap_or(0.0),
            total_count,
            distribution,
        },
        ratings,
        has_more,
    }))
}

/// Removes the caller's own rating for a question.
pub async fn delete_rating(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM ratings WHERE question_id = ? AND user_id = ?")
        .bind(question_id)
        .bind(session.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Rating not found".to_string()));
    }

    state.cache.delete(&cache::profile_key(session.user_id)).await;

    Ok(StatusCode::NO_CONTENT)
}
