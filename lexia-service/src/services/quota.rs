//! Quota enforcement for the demo offering.
//!
//! Three counters gate every authenticated chat message: messages today,
//! messages in the current conversation, and total conversations. The
//! first two reject with a typed error; the third silently evicts the
//! user's oldest conversation and lets the request proceed.
//!
//! Checks and the eventual message save are not wrapped in a transaction,
//! so the limits are soft under concurrent load. That is an accepted
//! property of this demo tier, not something callers may rely on being
//! airtight.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Local, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;

use lexia_core::error::AppError;

use crate::services::Database;

/// Hard limits for the demo tier. Injected so tests can vary them per case.
#[derive(Debug, Clone)]
pub struct QuotaLimits {
    pub max_messages_per_conversation: i64,
    pub max_messages_per_day: i64,
    pub max_conversations_per_user: i64,
    pub auto_delete_after_days: i64,
    /// Usage ratio at which `is_near_limit` turns on.
    pub warning_threshold: f64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_messages_per_conversation: 50,
            max_messages_per_day: 100,
            max_conversations_per_user: 20,
            auto_delete_after_days: 30,
            warning_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaErrorCode {
    DailyLimitReached,
    ConversationLimitReached,
    /// Part of the published taxonomy, but the conversation cap evicts the
    /// oldest session instead of failing, so nothing raises this today.
    TotalConversationsLimitReached,
}

/// Raised when a hard limit is exceeded.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct QuotaError {
    pub code: QuotaErrorCode,
    pub limit: i64,
    pub current: i64,
    pub message: String,
}

impl IntoResponse for QuotaError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct QuotaErrorBody {
            error: String,
            code: QuotaErrorCode,
            limit: i64,
            current: i64,
        }

        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(QuotaErrorBody {
                error: self.message,
                code: self.code,
                limit: self.limit,
                current: self.current,
            }),
        )
            .into_response()
    }
}

/// Either a limit was hit or the store failed underneath the check.
#[derive(Debug, Error)]
pub enum QuotaCheckError {
    #[error(transparent)]
    Exceeded(#[from] QuotaError),
    #[error(transparent)]
    Database(#[from] AppError),
}

/// Snapshot returned to callers; field names are the wire contract the
/// quota indicator in the UI consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub messages_count_today: i64,
    pub messages_in_session: i64,
    pub total_conversations: i64,
    pub remaining_today: i64,
    pub remaining_in_conversation: i64,
    pub is_near_limit: bool,
}

/// Read-time aggregation over the conversations table.
#[derive(Debug, Clone, Copy)]
pub struct QuotaCounts {
    pub messages_today: i64,
    pub messages_in_session: i64,
    pub distinct_sessions: i64,
}

/// Outcome of the pure limit evaluation.
#[derive(Debug, Clone)]
pub struct QuotaEvaluation {
    pub status: QuotaStatus,
    /// The conversation cap was hit: the caller should evict the user's
    /// oldest session before proceeding.
    pub evict_oldest_session: bool,
}

/// Evaluate counters against limits. Pure; the database never appears here.
pub fn evaluate(counts: QuotaCounts, limits: &QuotaLimits) -> Result<QuotaEvaluation, QuotaError> {
    if counts.messages_today >= limits.max_messages_per_day {
        return Err(QuotaError {
            code: QuotaErrorCode::DailyLimitReached,
            limit: limits.max_messages_per_day,
            current: counts.messages_today,
            message: format!(
                "Limite quotidienne atteinte ({} messages/jour)",
                limits.max_messages_per_day
            ),
        });
    }

    if counts.messages_in_session >= limits.max_messages_per_conversation {
        return Err(QuotaError {
            code: QuotaErrorCode::ConversationLimitReached,
            limit: limits.max_messages_per_conversation,
            current: counts.messages_in_session,
            message: format!(
                "Cette conversation a atteint {} messages. Créez une nouvelle conversation pour continuer.",
                limits.max_messages_per_conversation
            ),
        });
    }

    let evict_oldest_session = counts.distinct_sessions >= limits.max_conversations_per_user;

    let is_near_limit = counts.messages_in_session as f64
        / limits.max_messages_per_conversation as f64
        >= limits.warning_threshold
        || counts.messages_today as f64 / limits.max_messages_per_day as f64
            >= limits.warning_threshold;

    Ok(QuotaEvaluation {
        status: QuotaStatus {
            messages_count_today: counts.messages_today,
            messages_in_session: counts.messages_in_session,
            total_conversations: counts.distinct_sessions,
            remaining_today: limits.max_messages_per_day - counts.messages_today,
            remaining_in_conversation: limits.max_messages_per_conversation
                - counts.messages_in_session,
            is_near_limit,
        },
        evict_oldest_session,
    })
}

#[derive(Clone)]
pub struct QuotaService {
    db: Database,
    limits: QuotaLimits,
}

impl QuotaService {
    pub fn new(db: Database, limits: QuotaLimits) -> Self {
        Self { db, limits }
    }

    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    /// Check all quotas for a user.
    ///
    /// Anonymous callers are unmetered at this layer: demo traffic without
    /// an account is rate-limited by IP at the router instead.
    pub async fn check_user_quotas(
        &self,
        user_id: Option<&str>,
        session_id: &str,
    ) -> Result<QuotaStatus, QuotaCheckError> {
        let Some(user_id) = user_id else {
            return Ok(QuotaStatus {
                messages_count_today: 0,
                messages_in_session: 0,
                total_conversations: 0,
                remaining_today: self.limits.max_messages_per_day,
                remaining_in_conversation: self.limits.max_messages_per_conversation,
                is_near_limit: false,
            });
        };

        let counts = QuotaCounts {
            messages_today: self
                .db
                .count_user_messages_since(user_id, start_of_local_day())
                .await?,
            messages_in_session: self.db.count_session_messages(user_id, session_id).await?,
            distinct_sessions: self.db.count_distinct_sessions(user_id).await?,
        };

        let evaluation = evaluate(counts, &self.limits)?;

        if evaluation.evict_oldest_session {
            // Best effort: the current request proceeds even if this fails.
            if let Err(e) = self.evict_oldest_session(user_id).await {
                tracing::warn!(user_id, error = %e, "Failed to evict oldest conversation");
            }
        }

        Ok(evaluation.status)
    }

    async fn evict_oldest_session(&self, user_id: &str) -> Result<(), AppError> {
        if let Some(session_id) = self.db.oldest_session(user_id).await? {
            let deleted = self.db.delete_user_session(user_id, &session_id).await?;
            tracing::info!(
                user_id,
                session_id = %session_id,
                deleted,
                "Conversation cap reached, evicted oldest conversation"
            );
        }
        Ok(())
    }

    /// Delete conversations older than the retention window.
    pub async fn clean_old_conversations(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - chrono::Duration::days(self.limits.auto_delete_after_days);
        let deleted = self.db.delete_conversations_before(cutoff).await?;
        tracing::info!(
            deleted,
            days = self.limits.auto_delete_after_days,
            "Retention sweep removed old conversations"
        );
        Ok(deleted)
    }
}

/// Start of the current day in server-local time, as a UTC instant.
fn start_of_local_day() -> DateTime<Utc> {
    Local::now()
        .with_time(NaiveTime::MIN)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> QuotaLimits {
        QuotaLimits::default()
    }

    fn counts(today: i64, session: i64, sessions: i64) -> QuotaCounts {
        QuotaCounts {
            messages_today: today,
            messages_in_session: session,
            distinct_sessions: sessions,
        }
    }

    #[test]
    fn under_all_limits_passes_with_remaining() {
        let evaluation = evaluate(counts(10, 5, 3), &limits()).unwrap();
        assert_eq!(evaluation.status.remaining_today, 90);
        assert_eq!(evaluation.status.remaining_in_conversation, 45);
        assert_eq!(evaluation.status.total_conversations, 3);
        assert!(!evaluation.status.is_near_limit);
        assert!(!evaluation.evict_oldest_session);
    }

    #[test]
    fn daily_limit_rejects_with_actual_count() {
        let err = evaluate(counts(100, 5, 3), &limits()).unwrap_err();
        assert_eq!(err.code, QuotaErrorCode::DailyLimitReached);
        assert_eq!(err.limit, 100);
        assert_eq!(err.current, 100);

        let err = evaluate(counts(131, 5, 3), &limits()).unwrap_err();
        assert_eq!(err.current, 131);
    }

    #[test]
    fn conversation_limit_rejects_after_daily_check() {
        let err = evaluate(counts(10, 50, 3), &limits()).unwrap_err();
        assert_eq!(err.code, QuotaErrorCode::ConversationLimitReached);
        assert_eq!(err.limit, 50);
        assert_eq!(err.current, 50);
    }

    #[test]
    fn daily_check_takes_precedence_over_conversation_check() {
        let err = evaluate(counts(100, 50, 3), &limits()).unwrap_err();
        assert_eq!(err.code, QuotaErrorCode::DailyLimitReached);
    }

    #[test]
    fn conversation_cap_requests_eviction_instead_of_failing() {
        let evaluation = evaluate(counts(10, 5, 20), &limits()).unwrap();
        assert!(evaluation.evict_oldest_session);

        let evaluation = evaluate(counts(10, 5, 19), &limits()).unwrap();
        assert!(!evaluation.evict_oldest_session);
    }

    #[test]
    fn near_limit_flips_at_warning_threshold() {
        // 40/50 in the conversation is exactly 80%.
        let evaluation = evaluate(counts(10, 40, 3), &limits()).unwrap();
        assert!(evaluation.status.is_near_limit);

        // 80/100 for the day is exactly 80%.
        let evaluation = evaluate(counts(80, 5, 3), &limits()).unwrap();
        assert!(evaluation.status.is_near_limit);

        let evaluation = evaluate(counts(79, 39, 3), &limits()).unwrap();
        assert!(!evaluation.status.is_near_limit);
    }

    #[test]
    fn custom_limits_are_honored() {
        let custom = QuotaLimits {
            max_messages_per_conversation: 2,
            max_messages_per_day: 4,
            max_conversations_per_user: 1,
            auto_delete_after_days: 7,
            warning_threshold: 0.5,
        };

        let err = evaluate(counts(4, 0, 0), &custom).unwrap_err();
        assert_eq!(err.code, QuotaErrorCode::DailyLimitReached);
        assert_eq!(err.limit, 4);

        let evaluation = evaluate(counts(2, 1, 1), &custom).unwrap();
        assert!(evaluation.status.is_near_limit);
        assert!(evaluation.evict_oldest_session);
    }

    #[test]
    fn error_codes_serialize_to_wire_names() {
        let json = serde_json::to_string(&QuotaErrorCode::DailyLimitReached).unwrap();
        assert_eq!(json, "\"DAILY_LIMIT_REACHED\"");
        let json = serde_json::to_string(&QuotaErrorCode::ConversationLimitReached).unwrap();
        assert_eq!(json, "\"CONVERSATION_LIMIT_REACHED\"");
        let json = serde_json::to_string(&QuotaErrorCode::TotalConversationsLimitReached).unwrap();
        assert_eq!(json, "\"TOTAL_CONVERSATIONS_LIMIT_REACHED\"");
    }

    #[test]
    fn quota_status_serializes_camel_case() {
        let evaluation = evaluate(counts(1, 1, 1), &limits()).unwrap();
        let value = serde_json::to_value(&evaluation.status).unwrap();
        assert!(value.get("messagesCountToday").is_some());
        assert!(value.get("remainingInConversation").is_some());
        assert!(value.get("isNearLimit").is_some());
    }

    #[tokio::test]
    async fn anonymous_caller_is_unmetered() {
        // A lazily-connected pool never touches the network on this path.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/lexia_test")
            .expect("lazy pool");
        let service = QuotaService::new(Database::new(pool), QuotaLimits::default());

        let status = service
            .check_user_quotas(None, "session-1")
            .await
            .expect("anonymous check must not fail");
        assert_eq!(status.remaining_today, 100);
        assert_eq!(status.remaining_in_conversation, 50);
        assert!(!status.is_near_limit);
    }
}
