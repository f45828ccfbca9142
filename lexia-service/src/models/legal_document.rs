//! Legal document model - read-only corpus entries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A scraped legal text. The service only reads these; ingestion happens in
/// a separate pipeline.
#[derive(Debug, Clone, FromRow)]
pub struct LegalDocument {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    /// Truncated body kept for context building; full texts stay at the source.
    pub content_preview: String,
    pub source_url: Option<String>,
    pub article_number: Option<String>,
    pub created_at: DateTime<Utc>,
}
