use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use lexia_core::error::AppError;

use crate::dtos::conversations::{
    ConversationsResponse, DeleteConversationResponse, group_by_session,
};
use crate::startup::AppState;

/// GET /api/conversations - all conversations grouped by session.
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.db.list_conversations().await?;
    let conversations = group_by_session(rows);

    Ok(Json(ConversationsResponse {
        count: conversations.len(),
        conversations,
    }))
}

/// DELETE /api/conversations/:id - remove every row of a session.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "ID de conversation manquant"
        )));
    }

    let deleted = state.db.delete_session(&id).await?;
    tracing::info!(session_id = %id, deleted, "Deleted conversation");

    Ok(Json(DeleteConversationResponse {
        success: true,
        message: "Conversation supprimée avec succès".to_string(),
    }))
}
