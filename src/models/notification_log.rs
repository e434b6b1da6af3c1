use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationLog {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub status_history_id: Uuid,
    pub notification_type: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub error_message: String,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
