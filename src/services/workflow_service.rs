//! Status workflow engine: the only writer of status transitions. Each
//! accepted transition appends one ledger row and refreshes the denormalized
//! `candidates.status` in the same transaction, under a row lock so
//! concurrent requests against one candidate serialize instead of clobbering
//! each other. Transitions on different candidates never contend.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::candidate::{ApplicationStatus, Candidate};
use crate::models::status_history::StatusHistory;
use crate::services::notification_service::NotificationService;

pub const DEFAULT_CHANGED_BY: &str = "admin";

#[derive(Clone)]
pub struct WorkflowService {
    pool: PgPool,
    notifications: NotificationService,
}

impl WorkflowService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    /// Move a candidate to `new_status`. The only enforced rule is that the
    /// new status differs from the current one; REJECTED and ACCEPTED are
    /// deliberately not terminal.
    pub async fn transition(
        &self,
        candidate_id: Uuid,
        new_status: ApplicationStatus,
        comments: Option<String>,
        changed_by: Option<String>,
    ) -> Result<(Candidate, StatusHistory)> {
        let comments = comments.unwrap_or_default();
        let changed_by = changed_by.unwrap_or_else(|| DEFAULT_CHANGED_BY.to_string());

        let mut tx = self.pool.begin().await?;

        // The row lock serializes concurrent transitions for this candidate;
        // the same-status check below therefore always sees a fresh status.
        let current = sqlx::query_as::<_, Candidate>(
            "SELECT * FROM candidates WHERE id = $1 FOR UPDATE",
        )
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        if current.status == new_status {
            return Err(Error::InvalidTransition(
                "Candidate is already in this status".to_string(),
            ));
        }

        let history = sqlx::query_as::<_, StatusHistory>(
            r#"
            INSERT INTO status_history
                (id, candidate_id, previous_status, new_status, comments, changed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(current.status)
        .bind(new_status)
        .bind(&comments)
        .bind(&changed_by)
        .fetch_one(&mut *tx)
        .await?;

        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            UPDATE candidates
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(new_status)
        .bind(candidate_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(candidate_id = %candidate_id,
            previous = current.status.as_str(), new = new_status.as_str(), %changed_by,
            "status transition committed");

        // Best effort: a notification problem never reverts the transition.
        if let Err(err) = self.notifications.enqueue(candidate.id, history.id).await {
            tracing::warn!(candidate_id = %candidate.id, error = ?err,
                "failed to enqueue status notification");
        }

        Ok((candidate, history))
    }

    /// Full ledger for a candidate, newest first. Reads committed state only.
    pub async fn history(&self, candidate_id: Uuid) -> Result<Vec<StatusHistory>> {
        let entries = sqlx::query_as::<_, StatusHistory>(
            r#"
            SELECT * FROM status_history
            WHERE candidate_id = $1
            ORDER BY seq DESC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
