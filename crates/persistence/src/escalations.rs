//! Escalation record persistence

use async_trait::async_trait;
use parking_lot::RwLock;

use zoid_core::{EscalationRecord, EscalationStore, Result};

use crate::{PersistenceError, ScyllaClient};

/// ScyllaDB-backed escalation store
///
/// Records partition by call id, so the open-escalation check is a
/// single-partition read over that call's rows.
#[derive(Clone)]
pub struct ScyllaEscalationStore {
    client: ScyllaClient,
}

impl ScyllaEscalationStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EscalationStore for ScyllaEscalationStore {
    async fn insert(&self, record: &EscalationRecord) -> Result<()> {
        let query = format!(
            "INSERT INTO {}.escalations (
                call_id, escalation_id, reason, confidence_score,
                agent_id, escalated_at, resolved_at, resolution_notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &record.call_id,
                    record.escalation_id,
                    &record.reason,
                    record.confidence_score,
                    record.agent_id,
                    record.escalated_at.timestamp_millis(),
                    record.resolved_at.map(|t| t.timestamp_millis()),
                    &record.resolution_notes,
                ),
            )
            .await
            .map_err(PersistenceError::from)?;

        tracing::info!(
            escalation_id = %record.escalation_id,
            call_id = %record.call_id,
            reason = %record.reason,
            "Escalation recorded"
        );
        Ok(())
    }

    async fn has_open(&self, call_id: &str) -> Result<bool> {
        let query = format!(
            "SELECT resolved_at FROM {}.escalations WHERE call_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (call_id,))
            .await
            .map_err(PersistenceError::from)?;

        if let Some(rows) = result.rows {
            for row in rows {
                let (resolved_at,): (Option<i64>,) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                if resolved_at.is_none() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// In-memory escalation store for development and tests
#[derive(Default)]
pub struct InMemoryEscalationStore {
    records: RwLock<Vec<EscalationRecord>>,
}

impl InMemoryEscalationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EscalationRecord> {
        self.records.read().clone()
    }
}

#[async_trait]
impl EscalationStore for InMemoryEscalationStore {
    async fn insert(&self, record: &EscalationRecord) -> Result<()> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn has_open(&self, call_id: &str) -> Result<bool> {
        Ok(self
            .records
            .read()
            .iter()
            .any(|r| r.call_id == call_id && r.is_open()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn open_escalation_is_detected_per_call() {
        let store = InMemoryEscalationStore::new();
        let record = EscalationRecord::new("c1", "low confidence", Some(0.3), Uuid::new_v4());
        store.insert(&record).await.unwrap();

        assert!(store.has_open("c1").await.unwrap());
        assert!(!store.has_open("c2").await.unwrap());
    }

    #[tokio::test]
    async fn resolved_escalation_is_not_open() {
        let store = InMemoryEscalationStore::new();
        let mut record = EscalationRecord::new("c1", "keyword", None, Uuid::new_v4());
        record.resolved_at = Some(chrono::Utc::now());
        store.insert(&record).await.unwrap();

        assert!(!store.has_open("c1").await.unwrap());
    }
}
