use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::candidate_dto::HistoryEntryResponse;
use crate::models::candidate::{ApplicationStatus, Candidate, Department};
use crate::utils::time::age_on;

/// Raw query parameters; department and status arrive as strings and are
/// parsed against the closed enums in the handler so unlisted values get a
/// clear 400 instead of being silently accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub department: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminCandidateSummary {
    pub id: uuid::Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,
    pub years_of_experience: i32,
    pub department: Department,
    pub department_display: &'static str,
    pub status: ApplicationStatus,
    pub status_display: &'static str,
    pub has_resume: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Candidate> for AdminCandidateSummary {
    fn from(candidate: Candidate) -> Self {
        let age = age_on(candidate.date_of_birth, Utc::now().date_naive());
        Self {
            id: candidate.id,
            full_name: candidate.full_name,
            email: candidate.email,
            phone_number: candidate.phone_number,
            date_of_birth: candidate.date_of_birth,
            age,
            years_of_experience: candidate.years_of_experience,
            department: candidate.department,
            department_display: candidate.department.display_name(),
            status: candidate.status,
            status_display: candidate.status.display_name(),
            has_resume: !candidate.resume_key.is_empty(),
            created_at: candidate.created_at,
            updated_at: candidate.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<AdminCandidateSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminCandidateDetail {
    #[serde(flatten)]
    pub candidate: AdminCandidateSummary,
    pub resume_url: Option<String>,
    pub status_history: Vec<HistoryEntryResponse>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,

    #[validate(length(max = 1000, message = "comments must be at most 1000 characters"))]
    pub comments: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateResponse {
    pub candidate_id: uuid::Uuid,
    pub previous_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    pub updated_at: DateTime<Utc>,
}
