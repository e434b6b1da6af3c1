use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::dto::candidate_dto::{
    HistoryEntryResponse, HistoryResponse, RegisterCandidateResponse, RegistrationForm,
    StatusCheckResponse, StatusLookupQuery,
};
use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::AppState;

/// Public registration: multipart form with the scalar fields plus the
/// resume file. All the real work happens in the registry.
pub async fn register_candidate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut full_name = String::new();
    let mut email = String::new();
    let mut phone_number = String::new();
    let mut date_of_birth = None;
    let mut years_of_experience = None;
    let mut department = None;
    let mut resume: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "full_name" => full_name = field.text().await?,
            "email" => email = field.text().await?,
            "phone_number" => phone_number = field.text().await?,
            "date_of_birth" => {
                let raw = field.text().await?;
                date_of_birth = Some(
                    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                        Error::BadRequest("date_of_birth must be YYYY-MM-DD".into())
                    })?,
                );
            }
            "years_of_experience" => {
                let raw = field.text().await?;
                years_of_experience = Some(raw.parse::<i32>().map_err(|_| {
                    Error::BadRequest("years_of_experience must be an integer".into())
                })?);
            }
            "department" => {
                let raw = field.text().await?;
                department = Some(
                    raw.parse()
                        .map_err(|e: String| Error::BadRequest(e))?,
                );
            }
            "resume" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| Error::BadRequest("resume must have a filename".into()))?;
                let data = field.bytes().await?;
                resume = Some((filename, data));
            }
            _ => {}
        }
    }

    let date_of_birth =
        date_of_birth.ok_or_else(|| Error::BadRequest("date_of_birth is required".into()))?;
    let years_of_experience = years_of_experience
        .ok_or_else(|| Error::BadRequest("years_of_experience is required".into()))?;
    let department =
        department.ok_or_else(|| Error::BadRequest("department is required".into()))?;
    let (resume_filename, resume_bytes) =
        resume.ok_or_else(|| Error::BadRequest("resume file is required".into()))?;

    let form = RegistrationForm {
        full_name,
        email,
        phone_number,
        date_of_birth,
        years_of_experience,
        department,
    };

    let candidate = state
        .registry
        .register(form, &resume_filename, resume_bytes)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterCandidateResponse {
            candidate_id: candidate.id,
            status: candidate.status,
            created_at: candidate.created_at,
        }),
    ))
}

async fn status_response(state: &AppState, candidate: Candidate) -> Result<StatusCheckResponse> {
    let latest_feedback = state.registry.latest_feedback(candidate.id).await?;
    Ok(StatusCheckResponse {
        id: candidate.id,
        full_name: candidate.full_name,
        email: candidate.email,
        status: candidate.status,
        status_display: candidate.status.display_name(),
        department: candidate.department,
        department_display: candidate.department.display_name(),
        latest_feedback,
        created_at: candidate.created_at,
        updated_at: candidate.updated_at,
    })
}

/// Public status lookup by email.
pub async fn check_status(
    State(state): State<AppState>,
    Query(query): Query<StatusLookupQuery>,
) -> Result<Json<StatusCheckResponse>> {
    let candidate = state
        .registry
        .get_by_email(&query.email)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;
    Ok(Json(status_response(&state, candidate).await?))
}

/// Public status lookup by candidate id.
pub async fn get_status(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<StatusCheckResponse>> {
    let candidate = state
        .registry
        .get_by_id(candidate_id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;
    Ok(Json(status_response(&state, candidate).await?))
}

/// Full transition ledger, newest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>> {
    let candidate = state
        .registry
        .get_by_id(candidate_id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;

    let entries = state.workflow.history(candidate_id).await?;
    Ok(Json(HistoryResponse {
        candidate_id: candidate.id,
        candidate_name: candidate.full_name,
        current_status: candidate.status,
        status_history: entries
            .into_iter()
            .map(|entry| HistoryEntryResponse {
                previous_status: entry.previous_status,
                new_status: entry.new_status,
                comments: entry.comments,
                changed_by: entry.changed_by,
                changed_at: entry.changed_at,
            })
            .collect(),
    }))
}
