// src/models/media.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'media_files' table: one row per stored blob.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: i64,
    /// Blob-store key, e.g. `audio/math/1693200000_ab12cd34.mp3`.
    pub storage_key: String,
    pub subject: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub public_url: String,
    pub created_at: String,
}

/// Query parameters for uploading audio.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub subject: Option<String>,
}

/// Query parameters for listing media.
#[derive(Debug, Deserialize)]
pub struct MediaListParams {
    pub subject: Option<String>,
}
