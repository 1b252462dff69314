//! Bearer-token authentication for webhook endpoints
//!
//! The vendor signs every webhook with a shared secret. Health and metrics
//! stay public so probes and scrapers work without credentials.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Paths reachable without a token
const PUBLIC_PATHS: &[&str] = &["/health", "/metrics"];

/// Reject requests without a valid `Authorization: Bearer <token>` header
/// before any handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if PUBLIC_PATHS.iter().any(|p| path == *p) {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.starts_with("Bearer ") => {
            let provided = &value[7..];
            if constant_time_compare(provided.as_bytes(), state.webhook_token.as_bytes()) {
                next.run(request).await
            } else {
                tracing::warn!(path = %path, "Webhook request with invalid token");
                (StatusCode::UNAUTHORIZED, "Invalid token").into_response()
            }
        },
        Some(_) => (
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header format. Expected: Bearer <token>",
        )
            .into_response(),
        None => {
            tracing::warn!(path = %path, "Webhook request without Authorization header");
            (StatusCode::UNAUTHORIZED, "Missing Authorization header").into_response()
        },
    }
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
