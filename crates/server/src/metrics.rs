//! Prometheus metrics

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and describe the metrics we emit.
/// Idempotent; repeated calls return the existing handle.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            metrics::describe_counter!(
                "zoid_webhook_events_total",
                "Webhook events received, labeled by event type"
            );
            metrics::describe_counter!(
                "zoid_escalations_total",
                "Escalation attempts, labeled by outcome"
            );
            metrics::describe_histogram!(
                "zoid_turn_latency_seconds",
                "Per-turn latency, labeled by stage (rag, ai, total)"
            );

            handle
        })
        .clone()
}

pub fn record_webhook_event(event_type: &str) {
    metrics::counter!("zoid_webhook_events_total", "type" => event_type.to_string()).increment(1);
}

pub fn record_escalation(outcome: &str) {
    metrics::counter!("zoid_escalations_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_turn_latency(stage: &'static str, millis: u128) {
    metrics::histogram!("zoid_turn_latency_seconds", "stage" => stage)
        .record(millis as f64 / 1000.0);
}

/// `/metrics` endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}
