use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::candidate::ApplicationStatus;

/// One entry in a candidate's append-only status ledger. `previous_status`
/// is NULL only on the row written at registration. Rows are never updated
/// or deleted; `seq` totally orders entries even within one timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusHistory {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub seq: i64,
    pub previous_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    pub comments: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}
