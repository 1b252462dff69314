//! End-of-call report persistence

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use zoid_core::{CallLogStore, CallReport, Result};

use crate::{PersistenceError, ScyllaClient};

/// ScyllaDB-backed call log store
///
/// One row in `call_logs` per report, one row per non-empty transcript
/// message in `call_log_messages`.
#[derive(Clone)]
pub struct ScyllaCallLogStore {
    client: ScyllaClient,
}

impl ScyllaCallLogStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CallLogStore for ScyllaCallLogStore {
    async fn insert(&self, report: &CallReport) -> Result<(Uuid, usize)> {
        let log_id = Uuid::new_v4();
        let stored: Vec<_> = report.messages.iter().filter(|m| m.has_content()).collect();

        let query = format!(
            "INSERT INTO {}.call_logs (
                log_id, call_id, started_at, ended_at, ended_reason,
                duration_seconds, status, customer_number, language,
                summary, recording_url, cost, message_count, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    log_id,
                    &report.id,
                    &report.started_at,
                    &report.ended_at,
                    &report.ended_reason,
                    report.duration_seconds,
                    &report.status,
                    report.customer.as_ref().and_then(|c| c.number.clone()),
                    report.language(),
                    &report.summary,
                    &report.recording_url,
                    report.total_cost(),
                    stored.len() as i32,
                    Utc::now().timestamp_millis(),
                ),
            )
            .await
            .map_err(PersistenceError::from)?;

        let message_query = format!(
            "INSERT INTO {}.call_log_messages (log_id, seq, role, content, seconds_from_start)
             VALUES (?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        for (seq, message) in stored.iter().enumerate() {
            self.client
                .session()
                .query_unpaged(
                    message_query.clone(),
                    (
                        log_id,
                        seq as i32,
                        &message.role,
                        &message.message,
                        message.seconds_from_start,
                    ),
                )
                .await
                .map_err(PersistenceError::from)?;
        }

        tracing::info!(
            log_id = %log_id,
            call_id = %report.id,
            messages = stored.len(),
            "Call report persisted"
        );
        Ok((log_id, stored.len()))
    }
}

/// In-memory call log store for development and tests
#[derive(Default)]
pub struct InMemoryCallLogStore {
    logs: RwLock<Vec<(Uuid, CallReport)>>,
}

impl InMemoryCallLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }
}

#[async_trait]
impl CallLogStore for InMemoryCallLogStore {
    async fn insert(&self, report: &CallReport) -> Result<(Uuid, usize)> {
        let log_id = Uuid::new_v4();
        let count = report.messages.iter().filter(|m| m.has_content()).count();
        self.logs.write().push((log_id, report.clone()));
        Ok((log_id, count))
    }
}
