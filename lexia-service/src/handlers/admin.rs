use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};

use lexia_core::error::AppError;

use crate::config::Environment;
use crate::dtos::admin::{
    ActivityItem, AdminLoginRequest, AdminLoginResponse, AnalyticsResponse, OverviewResponse,
    QuestionItem, ServiceFlags, SystemStatusResponse,
};
use crate::dtos::truncate_chars;
use crate::services::ADMIN_SESSION_COOKIE;
use crate::startup::AppState;

/// Activity feeds show this many recent entries.
const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// Question previews in admin feeds are cut to this many characters.
const ACTIVITY_PREVIEW_CHARS: usize = 100;

/// POST /api/admin/auth - exchange the access key for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.admin_auth.verify_access_key(&request.access_key) {
        tracing::warn!("Rejected admin login with invalid access key");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Clé d'accès invalide"
        )));
    }

    let token = state
        .admin_auth
        .create_session_token()
        .map_err(AppError::InternalError)?;

    let cookie = Cookie::build((ADMIN_SESSION_COOKIE, token))
        .http_only(true)
        .secure(state.config.environment == Environment::Prod)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(state.admin_auth.session_hours()))
        .path("/")
        .build();

    tracing::info!("Admin session opened");

    Ok((
        jar.add(cookie),
        Json(AdminLoginResponse {
            success: true,
            message: "Authentification réussie".to_string(),
        }),
    ))
}

/// DELETE /api/admin/auth - close the admin session.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build((ADMIN_SESSION_COOKIE, "")).path("/").build();

    (
        jar.remove(removal),
        Json(AdminLoginResponse {
            success: true,
            message: "Déconnexion réussie".to_string(),
        }),
    )
}

/// GET /api/admin/stats/overview
pub async fn stats_overview(
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, AppError> {
    let total_sessions = state.db.count_distinct_sessions_total().await?;
    let total_rows = state.db.count_conversations().await?;
    let since = Utc::now() - Duration::hours(24);
    let conversations_today = state.db.count_messages_since(since).await?;
    let recent = state.db.recent_conversations(RECENT_ACTIVITY_LIMIT).await?;

    Ok(Json(OverviewResponse {
        total_conversations: total_sessions,
        // Every row holds one question and one answer.
        total_messages: total_rows * 2,
        conversations_today,
        recent_activity: recent
            .iter()
            .map(|conversation| ActivityItem {
                text: truncate_chars(&conversation.question, ACTIVITY_PREVIEW_CHARS),
                time: conversation.created_at,
                role: "user",
            })
            .collect(),
    }))
}

/// GET /api/admin/stats/analytics
pub async fn stats_analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let total_sessions = state.db.count_distinct_sessions_total().await?;
    let total_rows = state.db.count_conversations().await?;
    let week_ago = Utc::now() - Duration::days(7);
    let conversations_week = state.db.count_distinct_sessions_since(week_ago).await?;
    let recent = state.db.recent_conversations(RECENT_ACTIVITY_LIMIT).await?;

    Ok(Json(AnalyticsResponse {
        total_conversations: total_sessions,
        total_messages: total_rows * 2,
        user_messages: total_rows,
        assistant_messages: total_rows,
        conversations_week,
        top_questions: recent
            .iter()
            .map(|conversation| QuestionItem {
                question: truncate_chars(&conversation.question, ACTIVITY_PREVIEW_CHARS),
                date: conversation.created_at,
            })
            .collect(),
    }))
}

/// GET /api/admin/system/status
pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatusResponse> {
    let database_online = state.db.health_check().await.is_ok();

    Json(SystemStatusResponse {
        services: ServiceFlags {
            groq_api: state.provider.is_configured(),
            database: !state.config.database.url.is_empty(),
            admin_key: !state.config.security.admin_secret_key.is_empty(),
        },
        database_online,
        env: state.config.environment.as_str().to_string(),
    })
}
