//! Fire-and-forget candidate notifications. Transitions enqueue a pending
//! NotificationLog row; a background worker claims rows with
//! `FOR UPDATE SKIP LOCKED`, renders the message, pushes it through the
//! configured sink and records the outcome. Nothing here can fail a
//! registration or a transition.

use crate::error::Result;
use crate::models::candidate::ApplicationStatus;
use crate::models::notification_log::NotificationLog;
use reqwest::Client;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Where rendered notifications go. A webhook when one is configured,
/// otherwise the log (stand-in for a real email/SMS provider).
#[derive(Clone)]
pub enum NotificationSink {
    Webhook { client: Client, target_url: String },
    Log,
    #[cfg(test)]
    Failing,
}

impl NotificationSink {
    async fn deliver(&self, email: &str, message: &str) -> std::result::Result<(), String> {
        match self {
            NotificationSink::Webhook { client, target_url } => {
                let response = client
                    .post(target_url)
                    .json(&serde_json::json!({ "to": email, "message": message }))
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;
                if !response.status().is_success() {
                    return Err(format!("webhook returned {}", response.status()));
                }
                Ok(())
            }
            NotificationSink::Log => {
                tracing::info!(to = %email, %message, "notification delivered (log sink)");
                Ok(())
            }
            #[cfg(test)]
            NotificationSink::Failing => Err("sink unavailable".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    sink: NotificationSink,
}

impl NotificationService {
    pub fn new(pool: PgPool, webhook_url: Option<String>) -> Self {
        let sink = match webhook_url {
            Some(target_url) => NotificationSink::Webhook {
                client: Client::new(),
                target_url,
            },
            None => NotificationSink::Log,
        };
        Self { pool, sink }
    }

    /// Queue a status-update notification. Callers treat failure as
    /// non-fatal; the workflow transaction has already committed.
    pub async fn enqueue(
        &self,
        candidate_id: Uuid,
        status_history_id: Uuid,
    ) -> Result<NotificationLog> {
        let row = sqlx::query_as::<_, NotificationLog>(
            r#"
            INSERT INTO notification_logs (id, candidate_id, status_history_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(status_history_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Claim and deliver one pending notification. Returns Ok(true) when a
    /// row was processed, Ok(false) when the queue is empty.
    pub async fn run_once(&self) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT n.id, n.attempts, n.max_attempts, c.email, c.full_name, c.id AS candidate_id,
                   h.new_status, h.comments
            FROM notification_logs n
            JOIN candidates c ON c.id = n.candidate_id
            JOIN status_history h ON h.id = n.status_history_id
            WHERE n.status = 'pending' AND (n.next_retry_at IS NULL OR n.next_retry_at <= NOW())
            ORDER BY n.created_at ASC
            FOR UPDATE OF n SKIP LOCKED
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(false);
        };

        let log_id: Uuid = row.try_get("id")?;
        let attempts: i32 = row.try_get("attempts")?;
        let max_attempts: i32 = row.try_get("max_attempts")?;
        let email: String = row.try_get("email")?;
        let full_name: String = row.try_get("full_name")?;
        let candidate_id: Uuid = row.try_get("candidate_id")?;
        let new_status: ApplicationStatus = row.try_get("new_status")?;
        let comments: String = row.try_get("comments")?;

        let message = render_status_message(&full_name, candidate_id, new_status, &comments);

        match self.sink.deliver(&email, &message).await {
            Ok(()) => {
                sqlx::query(
                    r#"UPDATE notification_logs
                       SET status = 'success', attempts = attempts + 1, updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(log_id)
                .execute(&mut *tx)
                .await?;
            }
            Err(err) => {
                tracing::warn!(%log_id, error = %err, "notification delivery failed");
                // Exponential backoff until attempts run out.
                let exhausted = attempts + 1 >= max_attempts;
                sqlx::query(
                    r#"UPDATE notification_logs
                       SET status = CASE WHEN $2 THEN 'failed' ELSE 'pending' END,
                           attempts = attempts + 1,
                           error_message = $3,
                           next_retry_at = CASE WHEN $2 THEN NULL
                               ELSE NOW() + make_interval(secs => LEAST(3600, 30 * power(2::float, attempts))) END,
                           updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(log_id)
                .bind(exhausted)
                .bind(err)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }
}

pub fn render_status_message(
    full_name: &str,
    candidate_id: Uuid,
    new_status: ApplicationStatus,
    comments: &str,
) -> String {
    let mut message = match new_status {
        ApplicationStatus::Submitted => format!(
            "Hello {}, your application has been submitted successfully.",
            full_name
        ),
        ApplicationStatus::UnderReview => {
            format!("Hello {}, your application is now under review.", full_name)
        }
        ApplicationStatus::InterviewScheduled => format!(
            "Hello {}, congratulations! An interview has been scheduled for your application.",
            full_name
        ),
        ApplicationStatus::Rejected => format!(
            "Hello {}, unfortunately your application was not successful this time.",
            full_name
        ),
        ApplicationStatus::Accepted => format!(
            "Hello {}, congratulations! Your application has been accepted.",
            full_name
        ),
    };

    if !comments.is_empty() {
        message.push_str(&format!("\n\nAdditional feedback: {}", comments));
    }
    message.push_str(&format!(
        "\n\nYou can check your application status anytime at: /api/candidates/{}/status",
        candidate_id
    ));
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_includes_feedback_when_present() {
        let id = Uuid::new_v4();
        let message =
            render_status_message("Jane Doe", id, ApplicationStatus::UnderReview, "looks good");
        assert!(message.starts_with("Hello Jane Doe, your application is now under review."));
        assert!(message.contains("Additional feedback: looks good"));
        assert!(message.contains(&format!("/api/candidates/{}/status", id)));
    }

    #[test]
    fn message_omits_feedback_when_empty() {
        let id = Uuid::new_v4();
        let message = render_status_message("Jane Doe", id, ApplicationStatus::Accepted, "");
        assert!(!message.contains("Additional feedback"));
        assert!(message.contains("has been accepted"));
    }

    #[test]
    fn failing_sink_reports_the_error_without_panicking() {
        let err = tokio_test::block_on(NotificationSink::Failing.deliver("a@x.com", "hi"))
            .unwrap_err();
        assert_eq!(err, "sink unavailable");
    }
}
