//! Webhook event dispatcher
//!
//! One endpoint for the live-call events (`call.started`,
//! `user.transcription`, `call.ended`) and one for the asynchronous
//! end-of-call report. Every live-call failure path still returns a speakable
//! response body; internals are logged, never leaked to the caller.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use zoid_agent::TurnOutcome;
use zoid_core::{CallReport, Error};

use crate::metrics::{record_escalation, record_turn_latency, record_webhook_event};
use crate::state::AppState;

/// Live-call event posted by the telephony vendor
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub call_id: Option<String>,
    /// Final user transcription; some vendor versions send `message` instead
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Main webhook dispatcher
pub async fn handle_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Response {
    record_webhook_event(&event.event_type);

    match event.event_type.as_str() {
        "call.started" => handle_call_started(state, event).await,
        "user.transcription" => handle_transcription(state, event).await,
        "call.ended" => handle_call_ended(state, event).await,
        other => {
            tracing::warn!(event_type = %other, "Unknown webhook event type");
            Json(json!({ "status": "unknown_type" })).into_response()
        },
    }
}

async fn handle_call_started(state: AppState, event: WebhookEvent) -> Response {
    let call_id = event
        .call_id
        .unwrap_or_else(|| format!("call_{}", Utc::now().timestamp_millis()));
    let language_code = event.language.as_deref().unwrap_or("en-US");

    let (language, greeting) = state.agent.handle_call_started(&call_id, language_code);

    Json(json!({
        "status": "ok",
        "callId": call_id,
        "language": language.code(),
        "greeting": greeting,
        "timestamp": Utc::now().timestamp_millis(),
    }))
    .into_response()
}

async fn handle_transcription(state: AppState, event: WebhookEvent) -> Response {
    let call_id = event.call_id.as_deref().unwrap_or("unknown");
    let transcript = event
        .transcription
        .as_deref()
        .or(event.message.as_deref())
        .unwrap_or("");

    match state.agent.handle_transcription(call_id, transcript).await {
        Ok(TurnOutcome::Silence) => {
            Json(json!({ "response": "", "isFinal": false })).into_response()
        },
        Ok(TurnOutcome::Reply {
            response,
            language,
            context,
            metrics,
        }) => {
            record_turn_latency("rag", metrics.rag_ms);
            record_turn_latency("ai", metrics.ai_ms);
            record_turn_latency("total", metrics.total_ms);

            Json(json!({
                "status": "ok",
                "response": response,
                "language": language.code(),
                "context": context,
                "isFinal": true,
                "metrics": {
                    "ragMs": metrics.rag_ms as u64,
                    "aiMs": metrics.ai_ms as u64,
                    "totalMs": metrics.total_ms as u64,
                    "confidence": metrics.confidence,
                },
                "timestamp": Utc::now().timestamp_millis(),
            }))
            .into_response()
        },
        Ok(TurnOutcome::Escalation {
            response,
            language,
            transferred,
        }) => {
            record_escalation(if transferred { "transferred" } else { "not_transferred" });

            Json(json!({
                "status": "ok",
                "response": response,
                "language": language.code(),
                "transfer": transferred,
                "isFinal": true,
                "timestamp": Utc::now().timestamp_millis(),
            }))
            .into_response()
        },
        Err(Error::StateNotFound(call_id)) => {
            tracing::error!(call_id = %call_id, "Transcription for unknown call");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Call state not found" })),
            )
                .into_response()
        },
        Err(e) => {
            // Speak an apology in the call's language rather than surfacing
            // the failure
            tracing::error!(call_id = %call_id, error = %e, "Turn processing failed");
            let language = state
                .agent
                .store()
                .language(call_id)
                .await
                .unwrap_or_default();
            Json(json!({
                "response": language.apology(),
                "language": language.code(),
                "isFinal": true,
                "timestamp": Utc::now().timestamp_millis(),
            }))
            .into_response()
        },
    }
}

async fn handle_call_ended(state: AppState, event: WebhookEvent) -> Response {
    let call_id = event.call_id.as_deref().unwrap_or("unknown");

    match state.agent.handle_call_ended(call_id).await {
        Some(count) => {
            tracing::info!(call_id = %call_id, messages = count, "Call ended");
        },
        None => {
            tracing::warn!(call_id = %call_id, "call.ended for unknown call");
        },
    }

    Json(json!({ "status": "ok", "timestamp": Utc::now().timestamp_millis() })).into_response()
}

/// End-of-call report posted by the vendor after the call completes
#[derive(Debug, Deserialize)]
pub struct CallReportEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub report: CallReport,
}

/// `POST /api/call-report`
pub async fn handle_call_report(
    State(state): State<AppState>,
    Json(event): Json<CallReportEvent>,
) -> Response {
    record_webhook_event(&event.event_type);

    if event.event_type != "end-of-call-report" {
        tracing::warn!(event_type = %event.event_type, "Unexpected report event type");
        return Json(json!({ "status": "unknown_type" })).into_response();
    }

    match state.call_logs.insert(&event.report).await {
        Ok((log_id, messages_stored)) => Json(json!({
            "status": "ok",
            "callLogId": log_id,
            "messagesStored": messages_stored,
            "timestamp": Utc::now().timestamp_millis(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(call_id = %event.report.id, error = %e, "Failed to store call log");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to store call log" })),
            )
                .into_response()
        },
    }
}

/// `GET /api/call-report` acknowledges the endpoint for vendor configuration
pub async fn call_report_status() -> Response {
    Json(json!({
        "status": "ok",
        "message": "End-of-call report webhook is active",
    }))
    .into_response()
}
