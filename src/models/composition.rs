// src/models/composition.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::sgif::{ErrorSpan, Suggestion};

/// Represents the 'english_compositions' table. `error_analysis` and
/// `suggestions` are stored as JSON text and decoded on read.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CompositionRow {
    pub id: i64,
    pub user_id: i64,
    pub original_text: String,
    pub corrected_text: String,
    pub error_analysis: String,
    pub suggestions: String,
    pub sgif_category: String,
    pub confidence_score: f64,
    pub processing_time_ms: i64,
    pub created_at: String,
}

/// DTO for submitting a composition for correction.
#[derive(Debug, Deserialize, Validate)]
pub struct ComposeRequest {
    #[validate(length(min = 1, max = 5000, message = "Text must be 1 to 5000 characters."))]
    pub text: String,
}

/// Correction result returned to the client, JSON fields decoded.
#[derive(Debug, Serialize)]
pub struct CompositionResponse {
    pub id: i64,
    pub original_text: String,
    pub corrected_text: String,
    pub error_analysis: Vec<ErrorSpan>,
    pub suggestions: Vec<Suggestion>,
    pub sgif_category: String,
    pub confidence_score: f64,
    pub processing_time_ms: i64,
    pub created_at: Option<String>,
}
