use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::dtos::chat::SourceReference;
use crate::dtos::truncate_chars;
use crate::models::Conversation;

/// Conversation titles are derived from the first question, cut to this
/// many characters.
const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
    pub count: usize,
}

/// One logical conversation: every row sharing a session id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// The session id.
    pub id: String,
    pub title: String,
    pub messages: Vec<ConversationMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConversationMessage {
    pub id: String,
    pub role: &'static str,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceReference>>,
}

#[derive(Debug, Serialize)]
pub struct DeleteConversationResponse {
    pub success: bool,
    pub message: String,
}

/// Group rows into logical conversations: chronological messages, title
/// from the opening question, list ordered by most recent activity.
pub fn group_by_session(mut rows: Vec<Conversation>) -> Vec<ConversationSummary> {
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut grouped: Vec<ConversationSummary> = Vec::new();

    for row in rows {
        let position = match index.get(&row.session_id) {
            Some(&position) => position,
            None => {
                grouped.push(ConversationSummary {
                    id: row.session_id.clone(),
                    title: truncate_title(&row.question),
                    messages: Vec::new(),
                    created_at: row.created_at,
                    updated_at: row.created_at,
                });
                index.insert(row.session_id.clone(), grouped.len() - 1);
                grouped.len() - 1
            }
        };

        let summary = &mut grouped[position];
        summary.updated_at = row.created_at;

        let sources: Option<Vec<SourceReference>> = if row.sources.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&row.sources).ok()
        };

        summary.messages.push(ConversationMessage {
            id: format!("{}_q_{}", row.session_id, row.id),
            role: "user",
            content: row.question,
            timestamp: row.created_at,
            sources: None,
        });
        summary.messages.push(ConversationMessage {
            id: format!("{}_a_{}", row.session_id, row.id),
            role: "assistant",
            content: row.answer,
            timestamp: row.created_at,
            sources,
        });
    }

    grouped.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    grouped
}

fn truncate_title(question: &str) -> String {
    if question.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", truncate_chars(question, TITLE_MAX_CHARS))
    } else {
        question.to_string()
    }
}
