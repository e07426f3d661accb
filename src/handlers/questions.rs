// src/handlers/questions.rs

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    cache,
    error::AppError,
    export::{self, ExportFormat, ImportedQuestion},
    models::question::{
        CreateQuestionRequest, ImportError, ImportResult, Question, QuestionListParams,
        UpdateQuestionRequest,
    },
    state::AppState,
    utils::sanitize::clean_rich_text,
};

const DEFAULT_LIMIT: i64 = 100;

/// Lists active questions, optionally filtered by subject and difficulty.
///
/// Plain per-subject listings (no difficulty filter, default paging) are
/// served from the cache under `questions:<subject>`; anything else goes
/// straight to the database.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let cacheable = params.subject.is_some()
        && params.difficulty.is_none()
        && params.limit.is_none()
        && params.offset.is_none();

    if cacheable {
        let key = cache::questions_key(params.subject.as_deref().unwrap_or_default());
        if let Some(cached) = state.cache.get_json::<Vec<Question>>(&key).await {
            return Ok(Json(cached));
        }

        let questions = fetch_questions(&state.pool, &params).await?;
        state
            .cache
            .put_json(
                &key,
                &questions,
                Some(Duration::from_secs(state.config.cache_ttl_secs)),
            )
            .await?;
        return Ok(Json(questions));
    }

    let questions = fetch_questions(&state.pool, &params).await?;
    Ok(Json(questions))
}

async fn fetch_questions(
    pool: &SqlitePool,
    params: &QuestionListParams,
) -> Result<Vec<Question>, AppError> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM questions WHERE active = 1 AND is_deleted = 0");

    if let Some(subject) = &params.subject {
        builder.push(" AND subject = ");
        builder.push_bind(subject);
    }

    if let Some(difficulty) = &params.difficulty {
        builder.push(" AND difficulty = ");
        builder.push_bind(difficulty);
    }

    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(params.limit.unwrap_or(DEFAULT_LIMIT));
    builder.push(" OFFSET ");
    builder.push_bind(params.offset.unwrap_or(0));

    let questions = builder
        .build_query_as::<Question>()
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(questions)
}

/// Creates a new question.
/// Admin only. Invalidates the subject's listing cache.
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = insert_question(&state.pool, &payload).await?;

    state
        .cache
        .delete(&cache::questions_key(&payload.subject))
        .await;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn insert_question(
    pool: &SqlitePool,
    payload: &CreateQuestionRequest,
) -> Result<i64, AppError> {
    let explanation = payload.explanation.as_deref().map(clean_rich_text);

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO questions
         (subject, title, question_text, choices, correct_answer, explanation,
          difficulty, tags, media_urls)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(&payload.subject)
    .bind(payload.title.as_deref().unwrap_or(""))
    .bind(&payload.question_text)
    .bind(payload.choices.clone().map(SqlJson))
    .bind(&payload.correct_answer)
    .bind(explanation)
    .bind(payload.difficulty.as_deref().unwrap_or("medium"))
    .bind(payload.tags.clone().map(SqlJson))
    .bind(payload.media_urls.clone().map(SqlJson))
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(id)
}

/// Updates a question by ID via a dynamically built statement.
/// Admin only. Invalidates listing caches for the old and new subject.
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let old_subject: Option<(String,)> = sqlx::query_as(
        "SELECT subject FROM questions WHERE id = ? AND active = 1 AND is_deleted = 0",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;
    let (old_subject,) = old_subject.ok_or(AppError::NotFound("Question not found".to_string()))?;

    // Nothing to change, but only for a question that exists.
    if payload.is_empty() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(subject) = &payload.subject {
        separated.push("subject = ");
        separated.push_bind_unseparated(subject);
    }

    if let Some(title) = &payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(question_text) = &payload.question_text {
        separated.push("question_text = ");
        separated.push_bind_unseparated(question_text);
    }

    if let Some(choices) = &payload.choices {
        separated.push("choices = ");
        separated.push_bind_unseparated(SqlJson(choices.clone()));
    }

    if let Some(correct_answer) = &payload.correct_answer {
        separated.push("correct_answer = ");
        separated.push_bind_unseparated(correct_answer);
    }

    if let Some(explanation) = &payload.explanation {
        separated.push("explanation = ");
        separated.push_bind_unseparated(clean_rich_text(explanation));
    }

    if let Some(difficulty) = &payload.difficulty {
        separated.push("difficulty = ");
        separated.push_bind_unseparated(difficulty);
    }

    if let Some(tags) = &payload.tags {
        separated.push("tags = ");
        separated.push_bind_unseparated(SqlJson(tags.clone()));
    }

    if let Some(media_urls) = &payload.media_urls {
        separated.push("media_urls = ");
        separated.push_bind_unseparated(SqlJson(media_urls.clone()));
    }

    separated.push("updated_at = datetime('now')");

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND active = 1 AND is_deleted = 0");

    let result = builder.build().execute(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    state.cache.delete(&cache::questions_key(&old_subject)).await;
    if let Some(new_subject) = &payload.subject {
        if *new_subject != old_subject {
            state.cache.delete(&cache::questions_key(new_subject)).await;
        }
    }

    Ok(StatusCode::OK)
}

/// Soft-deletes a question by ID.
/// Admin only. Invalidates the subject's listing cache.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject: Option<(String,)> =
        sqlx::query_as("SELECT subject FROM questions WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    let (subject,) = subject.ok_or(AppError::NotFound("Question not found".to_string()))?;

    sqlx::query(
        "UPDATE questions SET is_deleted = 1, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(id)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to delete question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    state.cache.delete(&cache::questions_key(&subject)).await;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// 'json' or 'csv'.
    pub format: String,
    /// The document to import, as a string.
    pub content: String,
}

/// Bulk-imports questions from a JSON or CSV export.
/// Admin only. Items are inserted one by one; failures are collected
/// per item instead of failing the batch.
pub async fn import_questions(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let imported = match payload.format.to_ascii_lowercase().as_str() {
        "json" => export::from_json(&payload.content)?,
        "csv" => export::from_csv(&payload.content)?,
        "xml" | "qti" | "moodle" => {
            return Err(AppError::NotImplemented(
                "XML import is not implemented".to_string(),
            ));
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown import format '{}'",
                other
            )));
        }
    };

    let mut result = ImportResult {
        success: 0,
        failed: 0,
        errors: Vec::new(),
    };
    let mut touched_subjects = Vec::new();

    for (index, item) in imported.into_iter().enumerate() {
        match import_one(&state.pool, item).await {
            Ok(subject) => {
                result.success += 1;
                if !touched_subjects.contains(&subject) {
                    touched_subjects.push(subject);
                }
            }
            Err(e) => {
                result.failed += 1;
                result.errors.push(ImportError {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }

    for subject in touched_subjects {
        state.cache.delete(&cache::questions_key(&subject)).await;
    }

    Ok(Json(result))
}

async fn import_one(pool: &SqlitePool, item: ImportedQuestion) -> Result<String, AppError> {
    let request = CreateQuestionRequest {
        subject: item
            .subject
            .ok_or(AppError::BadRequest("Missing subject".to_string()))?,
        title: item.title,
        question_text: item
            .question_text
            .ok_or(AppError::BadRequest("Missing question_text".to_string()))?,
        choices: item.choices,
        correct_answer: item
            .correct_answer
            .ok_or(AppError::BadRequest("Missing correct_answer".to_string()))?,
        explanation: item.explanation,
        difficulty: item.difficulty,
        tags: item.tags,
        media_urls: None,
    };

    if let Err(validation_errors) = request.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    insert_question(pool, &request).await?;
    Ok(request.subject)
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: String,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
}

/// Serializes the (filtered) question list into the requested format.
pub async fn export_questions(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let format: ExportFormat = params.format.parse()?;

    let list_params = QuestionListParams {
        subject: params.subject,
        difficulty: params.difficulty,
        limit: Some(i64::MAX),
        offset: None,
    };
    let questions = fetch_questions(&state.pool, &list_params).await?;

    let body = export::export(format, &questions)?;

    Ok(([(header::CONTENT_TYPE, format.content_type())], body))
}
