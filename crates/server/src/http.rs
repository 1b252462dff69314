//! Router assembly and operational endpoints

use axum::{
    extract::Json,
    http::Method,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::webhook::{call_report_status, handle_call_report, handle_webhook};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/webhook", post(handle_webhook))
        .route("/api/call-report", post(handle_call_report))
        .route("/api/call-report", get(call_report_status))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Liveness probe; includes the active session count for quick inspection
async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "zoid-support",
        "version": env!("CARGO_PKG_VERSION"),
        "activeCalls": state.agent.store().len(),
    }))
}
