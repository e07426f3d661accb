// src/models/rating.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'ratings' table. One row per (question, user);
/// resubmitting replaces the previous rating.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub question_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

/// Rating row joined with the author's username for display.
#[derive(Debug, Serialize, FromRow)]
pub struct RatingEntry {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

/// DTO for submitting a rating.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRatingRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i64,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Aggregated statistics for a question's ratings.
#[derive(Debug, Serialize)]
pub struct RatingStats {
    pub average_rating: f64,
    pub total_count: i64,
    /// Counts for 1..=5 stars, index 0 = 1 star.
    pub distribution: [i64; 5],
}

/// Full response for the rating listing endpoint.
#[derive(Debug, Serialize)]
pub struct RatingListResponse {
    pub stats: RatingStats,
    pub ratings: Vec<RatingEntry>,
    pub has_more: bool,
}
