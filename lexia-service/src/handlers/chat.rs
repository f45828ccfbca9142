use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use lexia_core::error::AppError;

use crate::dtos::chat::{ChatRequest, ChatResponse, ChatStatusResponse, SourceReference};
use crate::middleware::CurrentUser;
use crate::models::Conversation;
use crate::services::QuotaCheckError;
use crate::services::prompt;
use crate::startup::AppState;

/// How many retrieved documents go into the prompt context.
const CONTEXT_DOCUMENT_LIMIT: usize = 3;

/// Answer confidence with and without matching documents.
const CONFIDENCE_WITH_CONTEXT: f64 = 0.85;
const CONFIDENCE_WITHOUT_CONTEXT: f64 = 0.5;

/// POST /api/chat - answer a legal question.
pub async fn submit_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    request.validate().map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!(
            "La question doit contenir au moins 10 caractères"
        ))
    })?;

    let session_id = request
        .session_id
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("session_{}", Uuid::new_v4()));

    let user_id = user.user_id();

    let quota = match state.quota.check_user_quotas(user_id, &session_id).await {
        Ok(status) => status,
        Err(QuotaCheckError::Exceeded(quota_error)) => {
            tracing::info!(
                user_id,
                session_id = %session_id,
                code = ?quota_error.code,
                current = quota_error.current,
                "Rejected chat message over quota"
            );
            return Ok(quota_error.into_response());
        }
        Err(QuotaCheckError::Database(e)) => return Err(e),
    };

    if quota.is_near_limit {
        tracing::info!(user_id, session_id = %session_id, "User is close to a quota limit");
    }

    if !state.provider.is_configured() {
        tracing::warn!("Completion provider not configured, returning setup instructions");
        return Ok(Json(ChatResponse {
            answer: setup_required_answer(&request.question),
            sources: Vec::new(),
            confidence: 0.0,
            session_id,
            conversation_id: format!("demo_{}", Uuid::new_v4()),
            timestamp: Utc::now().to_rfc3339(),
            documents_found: 0,
        })
        .into_response());
    }

    tracing::info!(session_id = %session_id, "Searching documents for chat context");
    let documents = state
        .retrieval
        .search_relevant_documents(&request.question, CONTEXT_DOCUMENT_LIMIT)
        .await;
    tracing::info!(found = documents.len(), "Document search for chat finished");

    let messages = prompt::build_messages(
        &request.question,
        &request.conversation_history,
        &documents,
    );

    let completion = state.provider.complete(&messages).await.map_err(|e| {
        tracing::error!(error = %e, "Completion provider call failed");
        AppError::BadGateway(e.to_string())
    })?;

    let answer = completion.text.unwrap_or_else(|| {
        "Désolé, je n'ai pas pu générer une réponse. Veuillez réessayer.".to_string()
    });

    let sources: Vec<SourceReference> = documents
        .iter()
        .map(SourceReference::from_document)
        .collect();

    let confidence = if documents.is_empty() {
        CONFIDENCE_WITHOUT_CONTEXT
    } else {
        CONFIDENCE_WITH_CONTEXT
    };

    let conversation = Conversation::new(
        session_id.clone(),
        user_id.map(str::to_string),
        request.question.clone(),
        answer.clone(),
        confidence,
        serde_json::to_string(&sources).unwrap_or_else(|_| "[]".to_string()),
    );

    // The answer is already generated; losing the save is logged, not fatal.
    if let Err(e) = state.db.insert_conversation(&conversation).await {
        tracing::error!(error = %e, session_id = %session_id, "Failed to save conversation");
    }

    Ok(Json(ChatResponse {
        answer,
        sources,
        confidence,
        session_id,
        conversation_id: format!("conv_{}", conversation.id),
        timestamp: Utc::now().to_rfc3339(),
        documents_found: documents.len(),
    })
    .into_response())
}

/// GET /api/chat - service status for the chat frontend.
pub async fn service_status(
    State(state): State<AppState>,
) -> Result<Json<ChatStatusResponse>, AppError> {
    let documents_count = state.db.count_documents().await?;
    let conversations_count = state.db.count_conversations().await?;
    let groq_configured = state.provider.is_configured();

    let message = if groq_configured {
        format!(
            "API prête ! {} documents juridiques disponibles ✅",
            documents_count
        )
    } else {
        "Configuration Groq nécessaire ⚠️".to_string()
    };

    Ok(Json(ChatStatusResponse {
        status: "operational".to_string(),
        name: "LexIA Chat API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        groq_configured,
        database_connected: true,
        documents_count,
        conversations_count,
        message,
    }))
}

fn setup_required_answer(question: &str) -> String {
    format!(
        "⚠️ **Configuration nécessaire**\n\n\
         Pour utiliser LexIA avec l'IA, vous devez :\n\n\
         1. Obtenir une clé API gratuite sur https://console.groq.com\n\
         2. Ajouter `GROQ_API_KEY=votre_clé_ici` dans le fichier `.env`\n\
         3. Redémarrer le service\n\n\
         **Votre question :** \"{}\"\n\n\
         Pour l'instant, l'API fonctionne en mode simulé. Une fois configurée, \
         vous aurez des réponses juridiques précises basées sur l'IA ! ✅",
        question
    )
}
