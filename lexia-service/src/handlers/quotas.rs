use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use lexia_core::error::AppError;

use crate::dtos::quotas::{QuotaParams, QuotaResponse};
use crate::middleware::CurrentUser;
use crate::services::QuotaCheckError;
use crate::startup::AppState;

/// GET /api/quotas?session_id=... - quota snapshot for the indicator widget.
pub async fn get_quotas(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<QuotaParams>,
) -> Result<Response, AppError> {
    let session_id = params
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("session_id est requis")))?;

    let user_id = user
        .user_id()
        .map(str::to_string)
        .or(params.user_id.filter(|u| !u.is_empty()));

    let status = match state
        .quota
        .check_user_quotas(user_id.as_deref(), &session_id)
        .await
    {
        Ok(status) => status,
        Err(QuotaCheckError::Exceeded(quota_error)) => {
            return Ok(quota_error.into_response());
        }
        Err(QuotaCheckError::Database(e)) => return Err(e),
    };

    let message = if status.is_near_limit {
        "Vous approchez de la limite"
    } else {
        "Tout va bien"
    }
    .to_string();

    Ok(Json(QuotaResponse { status, message }).into_response())
}
