//! End-to-end flows through the registry, workflow engine and listing
//! services against a real Postgres. Set DATABASE_URL to run; each test
//! skips cleanly when no database is available.

use std::env;

use bytes::Bytes;
use candidate_tracking_backend::dto::candidate_dto::RegistrationForm;
use candidate_tracking_backend::error::Error;
use candidate_tracking_backend::models::candidate::{ApplicationStatus, Department};
use candidate_tracking_backend::services::listing_service::CandidateFilters;
use candidate_tracking_backend::AppState;
use chrono::NaiveDate;
use uuid::Uuid;

fn pdf_resume(len: usize) -> Bytes {
    let mut data = b"%PDF-1.7\n".to_vec();
    data.resize(len.max(data.len()), b'x');
    Bytes::from(data)
}

fn form(tag: &str, department: Department) -> RegistrationForm {
    RegistrationForm {
        full_name: format!("Test Candidate {}", tag),
        email: format!("candidate-{}@example.com", tag),
        phone_number: format!("+{}", &tag[tag.len().saturating_sub(12)..]),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        years_of_experience: 5,
        department,
    }
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn test_state() -> Option<AppState> {
    if env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    }
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("ADMIN_TOKEN", "test_admin_token");
    env::set_var("STORAGE_BACKEND", "local");
    env::set_var(
        "UPLOADS_DIR",
        std::env::temp_dir().join("candidate-flow-tests").to_str().unwrap(),
    );

    // Tests share one process; the first one wins initialization.
    let _ = candidate_tracking_backend::config::init_config();
    let pool = candidate_tracking_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    Some(AppState::new(pool).expect("app state"))
}

#[tokio::test]
async fn registration_creates_candidate_with_initial_ledger_entry() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    let candidate = state
        .registry
        .register(form(&tag, Department::It), "resume.pdf", pdf_resume(2 * 1024 * 1024))
        .await
        .expect("registration");

    assert_eq!(candidate.status, ApplicationStatus::Submitted);
    assert!(candidate.resume_key.starts_with(&format!("resumes/{}/", candidate.id)));
    assert!(state.storage.exists(&candidate.resume_key).await.unwrap());

    let history = state.workflow.history(candidate.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_status, None);
    assert_eq!(history[0].new_status, ApplicationStatus::Submitted);
    assert_eq!(history[0].changed_by, "system");
}

#[tokio::test]
async fn transition_appends_ledger_and_updates_denormalized_status() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    let candidate = state
        .registry
        .register(form(&tag, Department::It), "resume.pdf", pdf_resume(1024))
        .await
        .unwrap();

    let (updated, entry) = state
        .workflow
        .transition(
            candidate.id,
            ApplicationStatus::UnderReview,
            Some("looks good".into()),
            None,
        )
        .await
        .expect("transition");

    assert_eq!(updated.status, ApplicationStatus::UnderReview);
    assert_eq!(entry.previous_status, Some(ApplicationStatus::Submitted));
    assert_eq!(entry.comments, "looks good");
    assert_eq!(entry.changed_by, "admin");

    let history = state.workflow.history(candidate.id).await.unwrap();
    assert_eq!(history.len(), 2);
    // Newest first.
    assert_eq!(history[0].new_status, ApplicationStatus::UnderReview);
    assert_eq!(history[1].new_status, ApplicationStatus::Submitted);

    let current = state.registry.get_by_id(candidate.id).await.unwrap().unwrap();
    assert_eq!(current.status, history[0].new_status);

    let feedback = state.registry.latest_feedback(candidate.id).await.unwrap();
    assert_eq!(feedback.as_deref(), Some("looks good"));
}

#[tokio::test]
async fn same_status_transition_is_rejected_without_a_ledger_row() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    let candidate = state
        .registry
        .register(form(&tag, Department::Hr), "resume.pdf", pdf_resume(1024))
        .await
        .unwrap();

    let err = state
        .workflow
        .transition(candidate.id, ApplicationStatus::Submitted, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));

    let history = state.workflow.history(candidate.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn transition_on_unknown_candidate_is_not_found() {
    let Some(state) = test_state().await else { return };

    let err = state
        .workflow
        .transition(Uuid::new_v4(), ApplicationStatus::UnderReview, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn duplicate_email_conflicts_regardless_of_case() {
    let Some(state) = test_state().await else { return };

    let first = form(&tag(), Department::It);
    state
        .registry
        .register(first.clone(), "resume.pdf", pdf_resume(1024))
        .await
        .unwrap();

    let mut second = form(&tag(), Department::It);
    second.email = first.email.to_uppercase();
    let err = state
        .registry
        .register(second, "resume.pdf", pdf_resume(1024))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { field: "email" }));

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM candidates WHERE LOWER(email) = LOWER($1)",
    )
    .bind(&first.email)
    .fetch_one(&state.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn duplicate_phone_conflicts_on_the_phone_field() {
    let Some(state) = test_state().await else { return };

    let first = form(&tag(), Department::Finance);
    state
        .registry
        .register(first.clone(), "resume.pdf", pdf_resume(1024))
        .await
        .unwrap();

    let mut second = form(&tag(), Department::Finance);
    second.phone_number = first.phone_number.clone();
    let err = state
        .registry
        .register(second, "resume.pdf", pdf_resume(1024))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { field: "phone_number" }));
}

#[tokio::test]
async fn invalid_experience_rejects_before_any_write() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    let mut bad = form(&tag, Department::It);
    bad.years_of_experience = 60;
    let email = bad.email.clone();

    let err = state
        .registry
        .register(bad, "resume.pdf", pdf_resume(1024))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE email = $1")
        .bind(&email)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn spoofed_resume_is_rejected_without_touching_storage_or_db() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    let bad = form(&tag, Department::It);
    let email = bad.email.clone();
    let err = state
        .registry
        .register(bad, "resume.pdf", Bytes::from_static(b"MZ\x90\x00not-a-pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ResumeRejected(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE email = $1")
        .bind(&email)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn concurrent_transitions_serialize_with_no_lost_updates() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    let candidate = state
        .registry
        .register(form(&tag, Department::It), "resume.pdf", pdf_resume(1024))
        .await
        .unwrap();

    let a = {
        let workflow = state.workflow.clone();
        let id = candidate.id;
        tokio::spawn(async move {
            workflow
                .transition(id, ApplicationStatus::UnderReview, None, None)
                .await
        })
    };
    let b = {
        let workflow = state.workflow.clone();
        let id = candidate.id;
        tokio::spawn(async move {
            workflow
                .transition(id, ApplicationStatus::Rejected, None, None)
                .await
        })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert!(accepted >= 1);

    // Oldest to newest, every entry's previous must be the prior entry's new:
    // no two transitions may have derived from the same stale status.
    let mut history = state.workflow.history(candidate.id).await.unwrap();
    history.reverse();
    assert_eq!(history[0].previous_status, None);
    for pair in history.windows(2) {
        assert_eq!(pair[1].previous_status, Some(pair[0].new_status));
    }

    let current = state.registry.get_by_id(candidate.id).await.unwrap().unwrap();
    assert_eq!(current.status, history.last().unwrap().new_status);
}

#[tokio::test]
async fn admin_listing_filters_and_paginates() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    for (i, dept) in [Department::It, Department::Hr, Department::It]
        .into_iter()
        .enumerate()
    {
        let mut f = form(&format!("{}{}", tag, i), dept);
        f.full_name = format!("Listed {} {}", tag, i);
        state
            .registry
            .register(f, "resume.pdf", pdf_resume(1024))
            .await
            .unwrap();
    }

    let filters = CandidateFilters {
        search: Some(format!("Listed {}", tag)),
        ..Default::default()
    };
    let page = state.listing.list(&filters, None, None).await.unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.results.len(), 3);
    assert_eq!(page.next, None);
    assert_eq!(page.previous, None);

    let it_only = CandidateFilters {
        department: Some(Department::It),
        search: Some(format!("Listed {}", tag)),
        ..Default::default()
    };
    let page = state.listing.list(&it_only, None, None).await.unwrap();
    assert_eq!(page.count, 2);

    // Case-insensitive search over name and email.
    let lower = CandidateFilters {
        search: Some(format!("listed {}", tag)),
        ..Default::default()
    };
    let page = state.listing.list(&lower, None, None).await.unwrap();
    assert_eq!(page.count, 3);

    let paged = state
        .listing
        .list(&filters, Some(1), Some(2))
        .await
        .unwrap();
    assert_eq!(paged.results.len(), 2);
    assert_eq!(paged.next, Some(2));
    assert_eq!(paged.previous, None);
}

#[tokio::test]
async fn resume_download_round_trips_through_storage() {
    let Some(state) = test_state().await else { return };
    let tag = tag();

    let body = pdf_resume(4096);
    let candidate = state
        .registry
        .register(form(&tag, Department::It), "original cv.pdf", body.clone())
        .await
        .unwrap();

    let (bytes, content_type, filename) =
        state.registry.resume_content(candidate.id).await.unwrap();
    assert_eq!(bytes, body);
    assert_eq!(content_type, "application/pdf");
    assert!(filename.contains("_resume_"));
    assert!(filename.ends_with(".pdf"));

    // Unknown candidate 404s.
    let err = state.registry.resume_content(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
