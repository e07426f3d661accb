// src/sgif.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One corrected span in the submitted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSpan {
    pub original: String,
    pub corrected: String,
    /// SGIF error category, S1 through S6.
    pub category: String,
    pub explanation: String,
}

/// A free-standing improvement suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub suggestion: String,
    pub reason: String,
}

/// Result of running a composition through the SGIF scoring framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub corrected_text: String,
    pub error_analysis: Vec<ErrorSpan>,
    pub suggestions: Vec<Suggestion>,
    pub sgif_category: String,
    pub confidence_score: f64,
}

/// Backend performing the actual correction.
///
/// SGIF scoring is provided by an external service and is opaque to this
/// codebase; the trait is the seam where a real client plugs in.
#[async_trait]
pub trait SgifBackend: Send + Sync {
    async fn correct(&self, text: &str) -> Result<Correction, AppError>;
}

/// Fallback backend: returns the input unchanged with category S6 and a
/// neutral confidence score. Used when no external scorer is configured,
/// and as the degraded result when one fails.
pub struct PassthroughBackend;

#[async_trait]
impl SgifBackend for PassthroughBackend {
    async fn correct(&self, text: &str) -> Result<Correction, AppError> {
        Ok(Correction {
            corrected_text: text.to_string(),
            error_analysis: Vec::new(),
            suggestions: Vec::new(),
            sgif_category: "S6".to_string(),
            confidence_score: 0.5,
        })
    }
}
