pub mod admin_routes;
pub mod candidate_routes;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{get_config, StorageBackendKind};
use crate::middleware::auth::require_admin_token;
use crate::AppState;

/// The full HTTP surface: public candidate endpoints, the token-guarded admin
/// surface, and the uploads mount when storage is local.
pub fn app(state: AppState) -> Router {
    let config = get_config();

    let base_routes = Router::new().route("/health", get(health::health));

    let public_api = Router::new()
        .route(
            "/api/candidates/register",
            post(candidate_routes::register_candidate),
        )
        .route("/api/candidates/status", get(candidate_routes::check_status))
        .route(
            "/api/candidates/:id/status",
            get(candidate_routes::get_status),
        )
        .route(
            "/api/candidates/:id/history",
            get(candidate_routes::get_history),
        );

    let admin_api = Router::new()
        .route("/api/admin/candidates", get(admin_routes::list_candidates))
        .route("/api/admin/candidates/:id", get(admin_routes::get_candidate))
        .route(
            "/api/admin/candidates/:id/status",
            patch(admin_routes::update_status),
        )
        .route(
            "/api/admin/candidates/:id/resume",
            get(admin_routes::download_resume),
        )
        .layer(axum::middleware::from_fn(require_admin_token));

    let mut app = base_routes.merge(public_api).merge(admin_api);

    if config.storage_backend == StorageBackendKind::Local {
        app = app.nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(&config.uploads_dir),
        );
    }

    app.with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        // Twice the resume cap plus multipart framing: an oversized resume
        // must still reach the validator so the rejection names its size.
        .layer(DefaultBodyLimit::max(
            config.max_resume_bytes * 2 + 1024 * 1024,
        ))
}
