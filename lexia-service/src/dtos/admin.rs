use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(rename = "accessKey")]
    pub access_key: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    /// Distinct sessions.
    pub total_conversations: i64,
    /// User and assistant messages combined.
    pub total_messages: i64,
    pub conversations_today: i64,
    pub recent_activity: Vec<ActivityItem>,
}

#[derive(Debug, Serialize)]
pub struct ActivityItem {
    pub text: String,
    pub time: DateTime<Utc>,
    pub role: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total_conversations: i64,
    pub total_messages: i64,
    pub user_messages: i64,
    pub assistant_messages: i64,
    /// Distinct sessions active over the last seven days.
    pub conversations_week: i64,
    pub top_questions: Vec<QuestionItem>,
}

#[derive(Debug, Serialize)]
pub struct QuestionItem {
    pub question: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatusResponse {
    pub services: ServiceFlags,
    pub database_online: bool,
    pub env: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFlags {
    pub groq_api: bool,
    pub database: bool,
    pub admin_key: bool,
}
