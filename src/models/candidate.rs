use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Department a candidate applies to. Closed set; anything else is rejected
/// at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "department")]
pub enum Department {
    #[sqlx(rename = "IT")]
    #[serde(rename = "IT")]
    It,
    #[sqlx(rename = "HR")]
    #[serde(rename = "HR")]
    Hr,
    #[sqlx(rename = "FINANCE")]
    #[serde(rename = "FINANCE")]
    Finance,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::It => "IT",
            Department::Hr => "HR",
            Department::Finance => "FINANCE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Department::It => "Information Technology",
            Department::Hr => "Human Resources",
            Department::Finance => "Finance",
        }
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IT" => Ok(Department::It),
            "HR" => Ok(Department::Hr),
            "FINANCE" => Ok(Department::Finance),
            other => Err(format!("unknown department: {}", other)),
        }
    }
}

/// Application status. The workflow engine is the only writer; the linear
/// SUBMITTED -> UNDER_REVIEW -> INTERVIEW_SCHEDULED -> ACCEPTED/REJECTED flow
/// is an operational convention, not enforced beyond "no same-status change".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status")]
pub enum ApplicationStatus {
    #[sqlx(rename = "SUBMITTED")]
    #[serde(rename = "SUBMITTED")]
    Submitted,
    #[sqlx(rename = "UNDER_REVIEW")]
    #[serde(rename = "UNDER_REVIEW")]
    UnderReview,
    #[sqlx(rename = "INTERVIEW_SCHEDULED")]
    #[serde(rename = "INTERVIEW_SCHEDULED")]
    InterviewScheduled,
    #[sqlx(rename = "REJECTED")]
    #[serde(rename = "REJECTED")]
    Rejected,
    #[sqlx(rename = "ACCEPTED")]
    #[serde(rename = "ACCEPTED")]
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::UnderReview => "UNDER_REVIEW",
            ApplicationStatus::InterviewScheduled => "INTERVIEW_SCHEDULED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Accepted => "ACCEPTED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Accepted => "Accepted",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(ApplicationStatus::Submitted),
            "UNDER_REVIEW" => Ok(ApplicationStatus::UnderReview),
            "INTERVIEW_SCHEDULED" => Ok(ApplicationStatus::InterviewScheduled),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            "ACCEPTED" => Ok(ApplicationStatus::Accepted),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub years_of_experience: i32,
    pub department: Department,
    pub status: ApplicationStatus,
    pub resume_key: String,
    pub resume_filename: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
