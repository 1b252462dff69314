//! Persistence layer
//!
//! ScyllaDB stores for the durable records the support agent produces:
//! the human agent directory, escalation records, and end-of-call logs.
//! Each store has an in-memory twin behind the same `zoid-core` trait for
//! development and tests; selection happens at startup from config.

pub mod agents;
pub mod call_logs;
pub mod client;
pub mod error;
pub mod escalations;
pub mod schema;

pub use agents::{InMemoryAgentDirectory, ScyllaAgentDirectory};
pub use call_logs::{InMemoryCallLogStore, ScyllaCallLogStore};
pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;
pub use escalations::{InMemoryEscalationStore, ScyllaEscalationStore};

use std::sync::Arc;

use zoid_config::PersistenceConfig;
use zoid_core::{AgentDirectory, CallLogStore, EscalationStore};

/// Combined persistence layer with all stores
pub struct PersistenceLayer {
    pub agents: Arc<dyn AgentDirectory>,
    pub escalations: Arc<dyn EscalationStore>,
    pub call_logs: Arc<dyn CallLogStore>,
}

/// Initialize the persistence layer.
///
/// With persistence enabled, connects to ScyllaDB and ensures the schema;
/// otherwise the in-memory stores are used (with a small seeded agent pool so
/// escalation works out of the box in development).
pub async fn init(config: &PersistenceConfig) -> Result<PersistenceLayer, PersistenceError> {
    if !config.enabled {
        tracing::info!("Persistence disabled, using in-memory stores");
        return Ok(PersistenceLayer {
            agents: Arc::new(InMemoryAgentDirectory::seeded(2)),
            escalations: Arc::new(InMemoryEscalationStore::new()),
            call_logs: Arc::new(InMemoryCallLogStore::new()),
        });
    }

    let client = ScyllaClient::connect(ScyllaConfig::from(config)).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        agents: Arc::new(ScyllaAgentDirectory::new(client.clone())),
        escalations: Arc::new(ScyllaEscalationStore::new(client.clone())),
        call_logs: Arc::new(ScyllaCallLogStore::new(client)),
    })
}
