use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::dtos::truncate_chars;
use crate::services::retrieval::ScoredDocument;

/// Previews in cited sources are cut to this many characters.
const SOURCE_PREVIEW_CHARS: usize = 150;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(custom(function = validate_question))]
    pub question: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<HistoryExchange>,
}

fn validate_question(question: &str) -> Result<(), ValidationError> {
    if question.trim().chars().count() < 10 {
        return Err(ValidationError::new("question_too_short"));
    }
    Ok(())
}

/// One past question/answer pair replayed for context.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryExchange {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceReference>,
    pub confidence: f64,
    pub session_id: String,
    pub conversation_id: String,
    pub timestamp: String,
    pub documents_found: usize,
}

/// A cited document, as returned to the client and stored alongside the
/// conversation row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReference {
    pub title: String,
    pub category: String,
    pub article: String,
    pub url: String,
    pub preview: String,
    pub relevance_score: f64,
}

impl SourceReference {
    pub fn from_document(document: &ScoredDocument) -> Self {
        Self {
            title: document.title.clone(),
            category: document.category.clone(),
            article: document
                .article_number
                .clone()
                .unwrap_or_else(|| "Référence".to_string()),
            url: document
                .source_url
                .clone()
                .unwrap_or_else(|| "https://www.gouv.ci".to_string()),
            preview: format!(
                "{}...",
                truncate_chars(&document.content_preview, SOURCE_PREVIEW_CHARS)
            ),
            relevance_score: document.similarity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatStatusResponse {
    pub status: String,
    pub name: String,
    pub version: String,
    pub groq_configured: bool,
    pub database_connected: bool,
    pub documents_count: i64,
    pub conversations_count: i64,
    pub message: String,
}
