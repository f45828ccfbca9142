use serde::{Deserialize, Serialize};

use crate::services::quota::QuotaStatus;

#[derive(Debug, Deserialize)]
pub struct QuotaParams {
    pub session_id: Option<String>,
    /// Explicit override used by the quota indicator; the `token` cookie
    /// wins when both are present.
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    #[serde(flatten)]
    pub status: QuotaStatus,
    pub message: String,
}
