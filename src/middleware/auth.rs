use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Guard for the admin surface: a shared token in `X-Admin-Token`, compared
/// in constant time. Admin identity management is out of scope; the token is
/// process configuration.
pub async fn require_admin_token(req: Request, next: Next) -> Response {
    let Some(header) = req.headers().get(ADMIN_TOKEN_HEADER) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing_admin_token"})),
        )
            .into_response();
    };
    let Ok(provided) = header.to_str() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "bad_admin_token"})),
        )
            .into_response();
    };

    let expected = &crate::config::get_config().admin_token;
    if !token_matches(provided, expected) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_admin_token"})),
        )
            .into_response();
    }

    next.run(req).await
}

fn token_matches(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        return false;
    }
    provided.ct_eq(expected).into()
}
