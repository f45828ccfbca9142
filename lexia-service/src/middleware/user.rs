use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;

use crate::services::{USER_TOKEN_COOKIE, UserClaims};
use crate::startup::AppState;

/// Optional end-user identity from the `token` cookie.
///
/// Extraction never rejects: a missing or invalid token simply yields an
/// anonymous caller.
pub struct CurrentUser(pub Option<UserClaims>);

impl CurrentUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|claims| claims.sub.as_str())
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let claims = jar
            .get(USER_TOKEN_COOKIE)
            .and_then(|cookie| state.user_tokens.verify(cookie.value()));

        Ok(CurrentUser(claims))
    }
}
