//! Candidate registration and reads. The registry is the only writer that
//! creates candidates; validation, uniqueness probes and resume storage all
//! happen before the single transaction that makes the candidate visible.

use bytes::Bytes;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::candidate_dto::RegistrationForm;
use crate::error::{Error, Result};
use crate::models::candidate::{ApplicationStatus, Candidate};
use crate::models::status_history::StatusHistory;
use crate::services::notification_service::NotificationService;
use crate::services::resume_validator;
use crate::storage::{resume_key, Storage, StorageError};

#[derive(Clone)]
pub struct RegistryService {
    pool: PgPool,
    storage: Storage,
    notifications: NotificationService,
    max_resume_bytes: usize,
}

impl RegistryService {
    pub fn new(
        pool: PgPool,
        storage: Storage,
        notifications: NotificationService,
        max_resume_bytes: usize,
    ) -> Self {
        Self {
            pool,
            storage,
            notifications,
            max_resume_bytes,
        }
    }

    /// Register a new candidate. Order matters: scalar validation, resume
    /// policy and uniqueness probes all run before any write; the resume is
    /// stored before the transaction that creates the candidate row together
    /// with its first history entry.
    pub async fn register(
        &self,
        form: RegistrationForm,
        resume_filename: &str,
        resume_bytes: Bytes,
    ) -> Result<Candidate> {
        form.validate()?;
        resume_validator::validate(&resume_bytes, resume_filename, self.max_resume_bytes)?;

        self.check_email_free(&form.email).await?;
        self.check_phone_free(&form.phone_number).await?;

        let candidate_id = Uuid::new_v4();
        let key = resume_key(candidate_id, resume_filename)?;
        self.storage.save(&key, &resume_bytes).await?;

        match self.insert_candidate(candidate_id, &form, &key, resume_filename).await {
            Ok((candidate, history)) => {
                tracing::info!(candidate_id = %candidate.id, email = %candidate.email,
                    "candidate registered");
                if let Err(err) = self.notifications.enqueue(candidate.id, history.id).await {
                    tracing::warn!(candidate_id = %candidate.id, error = ?err,
                        "failed to enqueue registration notification");
                }
                Ok(candidate)
            }
            Err(err) => {
                // The stored file is now an orphan; try to reclaim it, and
                // leave the key in the log for an external sweep if that
                // fails too.
                if let Err(cleanup_err) = self.storage.delete(&key).await {
                    tracing::error!(%key, error = ?cleanup_err,
                        "orphaned resume file could not be removed");
                }
                Err(err)
            }
        }
    }

    async fn insert_candidate(
        &self,
        candidate_id: Uuid,
        form: &RegistrationForm,
        resume_key: &str,
        resume_filename: &str,
    ) -> Result<(Candidate, StatusHistory)> {
        let mut tx = self.pool.begin().await?;

        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates
                (id, full_name, email, phone_number, date_of_birth,
                 years_of_experience, department, status, resume_key, resume_filename)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(candidate_id)
        .bind(&form.full_name)
        .bind(&form.email)
        .bind(&form.phone_number)
        .bind(form.date_of_birth)
        .bind(form.years_of_experience)
        .bind(form.department)
        .bind(ApplicationStatus::Submitted)
        .bind(resume_key)
        .bind(resume_filename)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let history = sqlx::query_as::<_, StatusHistory>(
            r#"
            INSERT INTO status_history (id, candidate_id, new_status, changed_by)
            VALUES ($1, $2, $3, 'system')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(ApplicationStatus::Submitted)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((candidate, history))
    }

    async fn check_email_free(&self, email: &str) -> Result<()> {
        let taken = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM candidates WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        if taken.is_some() {
            return Err(Error::Conflict { field: "email" });
        }
        Ok(())
    }

    async fn check_phone_free(&self, phone_number: &str) -> Result<()> {
        let taken =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM candidates WHERE phone_number = $1")
                .bind(phone_number)
                .fetch_optional(&self.pool)
                .await?;
        if taken.is_some() {
            return Err(Error::Conflict {
                field: "phone_number",
            });
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(candidate)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>(
            "SELECT * FROM candidates WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(candidate)
    }

    /// Comment from the newest history entry, empty comments treated as no
    /// feedback.
    pub async fn latest_feedback(&self, candidate_id: Uuid) -> Result<Option<String>> {
        let comment = sqlx::query_scalar::<_, String>(
            r#"
            SELECT comments FROM status_history
            WHERE candidate_id = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment.filter(|c| !c.is_empty()))
    }

    /// Resume bytes plus download metadata for the admin surface. 404s when
    /// the candidate is unknown or the stored object is gone.
    pub async fn resume_content(&self, candidate_id: Uuid) -> Result<(Bytes, String, String)> {
        let candidate = self
            .get_by_id(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        if candidate.resume_key.is_empty() {
            return Err(Error::NotFound(
                "Resume not found for this candidate".to_string(),
            ));
        }
        if !self.storage.exists(&candidate.resume_key).await? {
            tracing::error!(candidate_id = %candidate.id, key = %candidate.resume_key,
                "resume key present but object missing in storage");
            return Err(Error::Storage(StorageError::NotFound(
                candidate.resume_key.clone(),
            )));
        }

        let bytes = self.storage.retrieve(&candidate.resume_key).await?;
        let content_type = if candidate.resume_key.ends_with(".pdf") {
            "application/pdf".to_string()
        } else {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string()
        };
        let download_name = download_filename(&candidate.full_name, &candidate.resume_filename);
        Ok((bytes, content_type, download_name))
    }

    pub fn resume_url(&self, candidate: &Candidate) -> Option<String> {
        if candidate.resume_key.is_empty() {
            return None;
        }
        match self.storage.url_for(&candidate.resume_key) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(candidate_id = %candidate.id, error = ?err,
                    "could not build resume url");
                None
            }
        }
    }
}

/// `<candidate name>_resume_<original filename>` with anything shell- or
/// header-hostile flattened to underscores.
pub fn download_filename(full_name: &str, original: &str) -> String {
    let clean = |s: &str| {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>()
    };
    format!("{}_resume_{}", clean(full_name), clean(original))
}

/// Uniqueness probes run first for friendly errors; a concurrent insert can
/// still trip the unique indexes, which maps to the same conflict.
fn map_unique_violation(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("candidates_email_lower_idx") => Error::Conflict { field: "email" },
                Some("candidates_phone_idx") => Error::Conflict {
                    field: "phone_number",
                },
                _ => Error::Conflict { field: "candidate" },
            };
        }
    }
    err.into()
}
