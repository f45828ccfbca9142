use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use lexia_core::error::AppError;

use crate::services::ADMIN_SESSION_COOKIE;
use crate::startup::AppState;

/// Middleware gating the admin dashboard API behind the session cookie.
pub async fn admin_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(ADMIN_SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    let Some(token) = token else {
        return Err(AppError::Unauthorized(anyhow::anyhow!("Non autorisé")));
    };

    if state.admin_auth.verify_session_token(&token).is_none() {
        return Err(AppError::Unauthorized(anyhow::anyhow!("Non autorisé")));
    }

    Ok(next.run(req).await)
}
