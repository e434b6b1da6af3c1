use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{
    AdminCandidateDetail, AdminCandidateSummary, ListQuery, ListResponse, StatusUpdateRequest,
    StatusUpdateResponse,
};
use crate::dto::candidate_dto::HistoryEntryResponse;
use crate::error::{Error, Result};
use crate::services::listing_service::CandidateFilters;
use crate::AppState;

pub async fn list_candidates(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>> {
    let filters = CandidateFilters {
        department: query
            .department
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(Error::BadRequest)?,
        status: query
            .status
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(Error::BadRequest)?,
        search: query.search,
    };
    let page = state
        .listing
        .list(&filters, query.page, query.page_size)
        .await?;

    Ok(Json(ListResponse {
        count: page.count,
        next: page.next,
        previous: page.previous,
        results: page
            .results
            .into_iter()
            .map(AdminCandidateSummary::from)
            .collect(),
    }))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<AdminCandidateDetail>> {
    let candidate = state
        .registry
        .get_by_id(candidate_id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;

    let resume_url = state.registry.resume_url(&candidate);
    let entries = state.workflow.history(candidate_id).await?;

    Ok(Json(AdminCandidateDetail {
        candidate: AdminCandidateSummary::from(candidate),
        resume_url,
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

pub async fn update_status(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>> {
    request.validate()?;

    let (candidate, history) = state
        .workflow
        .transition(
            candidate_id,
            request.status,
            request.comments,
            request.changed_by,
        )
        .await?;

    Ok(Json(StatusUpdateResponse {
        candidate_id: candidate.id,
        previous_status: history.previous_status,
        new_status: history.new_status,
        updated_at: candidate.updated_at,
    }))
}

/// Stream the stored resume back as an attachment named after the candidate.
pub async fn download_resume(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (bytes, content_type, filename) = state.registry.resume_content(candidate_id).await?;

    tracing::info!(%candidate_id, %filename, "resume downloaded by admin");

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes))
}
