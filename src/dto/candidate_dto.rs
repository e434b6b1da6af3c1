use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::candidate::{ApplicationStatus, Department};
use crate::utils::time::age_on;

pub const MINIMUM_AGE_YEARS: i32 = 16;

/// Scalar registration fields, collected from the multipart form before the
/// resume file is considered.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 1, max = 255, message = "full name must be 1-255 characters"))]
    pub full_name: String,

    #[validate(
        email(message = "invalid email address"),
        length(max = 254, message = "email must be at most 254 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 20, message = "phone number must be 1-20 characters"))]
    pub phone_number: String,

    #[validate(custom(function = validate_minimum_age))]
    pub date_of_birth: NaiveDate,

    #[validate(range(min = 0, max = 50, message = "years of experience must be between 0 and 50"))]
    pub years_of_experience: i32,

    pub department: Department,
}

fn validate_minimum_age(date_of_birth: &NaiveDate) -> Result<(), ValidationError> {
    let today = Utc::now().date_naive();
    if age_on(*date_of_birth, today) < MINIMUM_AGE_YEARS {
        let mut error = ValidationError::new("minimum_age");
        error.message = Some("candidate must be at least 16 years old".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterCandidateResponse {
    pub candidate_id: uuid::Uuid,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusLookupQuery {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCheckResponse {
    pub id: uuid::Uuid,
    pub full_name: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub status_display: &'static str,
    pub department: Department,
    pub department_display: &'static str,
    pub latest_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntryResponse {
    pub previous_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    pub comments: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub candidate_id: uuid::Uuid,
    pub candidate_name: String,
    pub current_status: ApplicationStatus,
    pub status_history: Vec<HistoryEntryResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            full_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone_number: "+1234567890".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            years_of_experience: 5,
            department: Department::It,
        }
    }

    #[test]
    fn valid_form_passes() {
        valid_form().validate().unwrap();
    }

    #[test]
    fn experience_out_of_range_names_the_field() {
        let mut form = valid_form();
        form.years_of_experience = 60;
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("years_of_experience"));
    }

    #[test]
    fn underage_candidate_is_rejected_on_date_of_birth() {
        let mut form = valid_form();
        form.date_of_birth = Utc::now().date_naive() - chrono::Duration::days(365 * 10);
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("date_of_birth"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut form = valid_form();
        form.email = "not-an-email".into();
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
