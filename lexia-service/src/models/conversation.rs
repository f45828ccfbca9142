//! Conversation model - one row per answered chat message.
//!
//! Rows sharing a `session_id` form one multi-turn conversation. Rows are
//! append-only; they are removed by explicit deletion, quota eviction, or
//! the retention sweep, never updated.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: Option<String>,
    pub question: String,
    pub answer: String,
    pub confidence: f64,
    /// JSON-serialized list of cited sources.
    pub sources: String,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        session_id: String,
        user_id: Option<String>,
        question: String,
        answer: String,
        confidence: f64,
        sources: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            user_id,
            question,
            answer,
            confidence,
            sources,
            created_at: Utc::now(),
        }
    }
}
