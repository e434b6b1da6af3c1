//! Admin surface over HTTP: auth middleware, status update endpoint and
//! error mapping. Requires DATABASE_URL; skips cleanly otherwise.

use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, patch},
    Router,
};
use bytes::Bytes;
use candidate_tracking_backend::dto::candidate_dto::RegistrationForm;
use candidate_tracking_backend::models::candidate::Department;
use candidate_tracking_backend::{routes, AppState};
use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_TOKEN: &str = "test_admin_token";

async fn test_state() -> Option<AppState> {
    if env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    }
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("ADMIN_TOKEN", ADMIN_TOKEN);
    env::set_var("STORAGE_BACKEND", "local");
    env::set_var(
        "UPLOADS_DIR",
        std::env::temp_dir().join("candidate-flow-tests").to_str().unwrap(),
    );

    let _ = candidate_tracking_backend::config::init_config();
    let pool = candidate_tracking_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    Some(AppState::new(pool).expect("app state"))
}

fn admin_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/admin/candidates",
            get(routes::admin_routes::list_candidates),
        )
        .route(
            "/api/admin/candidates/:id/status",
            patch(routes::admin_routes::update_status),
        )
        .route(
            "/api/admin/candidates/:id/resume",
            get(routes::admin_routes::download_resume),
        )
        .layer(axum::middleware::from_fn(
            candidate_tracking_backend::middleware::auth::require_admin_token,
        ))
        .with_state(state)
}

async fn seed_candidate(state: &AppState) -> Uuid {
    let tag = Uuid::new_v4().simple().to_string();
    let mut data = b"%PDF-1.7\n".to_vec();
    data.resize(2048, b'x');
    let candidate = state
        .registry
        .register(
            RegistrationForm {
                full_name: format!("Api Candidate {}", tag),
                email: format!("api-{}@example.com", tag),
                phone_number: format!("+{}", &tag[tag.len() - 12..]),
                date_of_birth: NaiveDate::from_ymd_opt(1992, 3, 4).unwrap(),
                years_of_experience: 3,
                department: Department::It,
            },
            "resume.pdf",
            Bytes::from(data),
        )
        .await
        .expect("seed candidate");
    candidate.id
}

#[tokio::test]
async fn admin_endpoints_reject_missing_or_wrong_token() {
    let Some(state) = test_state().await else { return };
    let app = admin_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/candidates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/candidates")
                .header("x-admin-token", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_update_round_trip_and_same_status_rejection() {
    let Some(state) = test_state().await else { return };
    let candidate_id = seed_candidate(&state).await;
    let app = admin_router(state);

    let patch_request = |body: JsonValue| {
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/admin/candidates/{}/status", candidate_id))
            .header("x-admin-token", ADMIN_TOKEN)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(patch_request(json!({
            "status": "UNDER_REVIEW",
            "comments": "promising profile"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["previous_status"], "SUBMITTED");
    assert_eq!(body["new_status"], "UNDER_REVIEW");

    // Same status again: specific message, 400.
    let response = app
        .clone()
        .oneshot(patch_request(json!({ "status": "UNDER_REVIEW" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Candidate is already in this status");

    // Unknown status never deserializes into the closed enum.
    let response = app
        .oneshot(patch_request(json!({ "status": "ARCHIVED" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn resume_download_sets_attachment_headers() {
    let Some(state) = test_state().await else { return };
    let candidate_id = seed_candidate(&state).await;
    let app = admin_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/admin/candidates/{}/resume", candidate_id))
                .header("x-admin-token", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\""));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(body.starts_with(b"%PDF"));

    // Unknown candidate: 404.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/admin/candidates/{}/resume", Uuid::new_v4()))
                .header("x-admin-token", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
