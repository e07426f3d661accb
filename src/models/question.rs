// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Subject bucket (e.g., "math", "english"). Drives the per-subject
    /// listing cache key.
    pub subject: String,

    pub title: String,

    /// The text content of the question.
    pub question_text: String,

    /// Answer choices (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database; NULL for free-form questions.
    pub choices: Option<Json<Vec<String>>>,

    /// The correct answer key or content.
    pub correct_answer: String,

    /// Explanation shown after answering.
    pub explanation: Option<String>,

    /// Difficulty label: 'easy', 'medium', 'hard'.
    pub difficulty: String,

    pub tags: Option<Json<Vec<String>>>,
    pub media_urls: Option<Json<Vec<String>>>,

    pub active: bool,
    pub is_deleted: bool,

    pub created_at: String,
    pub updated_at: String,
}

/// DTO for creating a new question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 50))]
    pub subject: String,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(custom(function = validate_choices))]
    pub choices: Option<Vec<String>>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub media_urls: Option<Vec<String>>,
}

fn validate_choices(choices: &[String]) -> Result<(), validator::ValidationError> {
    if choices.is_empty() {
        return Err(validator::ValidationError::new("choices_cannot_be_empty"));
    }
    for choice in choices {
        if choice.len() > 500 {
            return Err(validator::ValidationError::new("choice_too_long"));
        }
    }
    Ok(())
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub subject: Option<String>,
    pub title: Option<String>,
    pub question_text: Option<String>,
    pub choices: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub media_urls: Option<Vec<String>>,
}

impl UpdateQuestionRequest {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.title.is_none()
            && self.question_text.is_none()
            && self.choices.is_none()
            && self.correct_answer.is_none()
            && self.explanation.is_none()
            && self.difficulty.is_none()
            && self.tags.is_none()
            && self.media_urls.is_none()
    }
}

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Outcome of a bulk import: per-item results, never a batch failure.
#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Serialize)]
pub struct ImportError {
    pub index: usize,
    pub error: String,
}
