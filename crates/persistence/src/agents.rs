//! Human support agent directory

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use zoid_core::{AgentDirectory, AgentStatus, AvailableAgent, Result};

use crate::{PersistenceError, ScyllaClient};

/// ScyllaDB-backed agent directory
///
/// Availability reads hit the `agents_by_status` partition; status writes
/// update both that partition and the registry row.
#[derive(Clone)]
pub struct ScyllaAgentDirectory {
    client: ScyllaClient,
}

impl ScyllaAgentDirectory {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    /// Register or update an agent. Used for seeding and operator tooling.
    pub async fn upsert(
        &self,
        agent_id: Uuid,
        name: &str,
        contact_address: &str,
        status: AgentStatus,
    ) -> std::result::Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.support_agents (agent_id, name, contact_address, status, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    agent_id,
                    name,
                    contact_address,
                    status.as_str(),
                    Utc::now().timestamp_millis(),
                ),
            )
            .await?;

        let by_status = format!(
            "INSERT INTO {}.agents_by_status (status, agent_id, contact_address) VALUES (?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(by_status, (status.as_str(), agent_id, contact_address))
            .await?;

        tracing::info!(agent_id = %agent_id, status = status.as_str(), "Agent upserted");
        Ok(())
    }

    async fn current_status(
        &self,
        agent_id: Uuid,
    ) -> std::result::Result<Option<(String, String)>, PersistenceError> {
        let query = format!(
            "SELECT status, contact_address FROM {}.support_agents WHERE agent_id = ?",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (agent_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (status, contact): (String, String) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                return Ok(Some((status, contact)));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl AgentDirectory for ScyllaAgentDirectory {
    async fn find_available(&self) -> Result<Option<AvailableAgent>> {
        let query = format!(
            "SELECT agent_id, contact_address FROM {}.agents_by_status WHERE status = ? LIMIT 1",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (AgentStatus::Available.as_str(),))
            .await
            .map_err(PersistenceError::from)?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (agent_id, contact_address): (Uuid, String) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                return Ok(Some(AvailableAgent {
                    agent_id,
                    contact_address,
                }));
            }
        }
        Ok(None)
    }

    async fn set_status(&self, agent_id: Uuid, status: AgentStatus) -> Result<()> {
        let Some((old_status, contact_address)) = self.current_status(agent_id).await? else {
            return Err(PersistenceError::InvalidData(format!(
                "Unknown agent {}",
                agent_id
            ))
            .into());
        };

        let update = format!(
            "UPDATE {}.support_agents SET status = ?, updated_at = ? WHERE agent_id = ?",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                update,
                (status.as_str(), Utc::now().timestamp_millis(), agent_id),
            )
            .await
            .map_err(PersistenceError::from)?;

        let delete = format!(
            "DELETE FROM {}.agents_by_status WHERE status = ? AND agent_id = ?",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(delete, (old_status, agent_id))
            .await
            .map_err(PersistenceError::from)?;

        let insert = format!(
            "INSERT INTO {}.agents_by_status (status, agent_id, contact_address) VALUES (?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(insert, (status.as_str(), agent_id, contact_address))
            .await
            .map_err(PersistenceError::from)?;

        tracing::info!(agent_id = %agent_id, status = status.as_str(), "Agent status updated");
        Ok(())
    }
}

/// In-memory agent directory for development and tests
pub struct InMemoryAgentDirectory {
    agents: RwLock<Vec<(Uuid, String, AgentStatus)>>,
}

impl InMemoryAgentDirectory {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(Vec::new()),
        }
    }

    /// Seed a directory with `count` available agents
    pub fn seeded(count: usize) -> Self {
        let agents = (0..count)
            .map(|i| {
                (
                    Uuid::new_v4(),
                    format!("+1555010{:02}", i),
                    AgentStatus::Available,
                )
            })
            .collect();
        Self {
            agents: RwLock::new(agents),
        }
    }

    pub fn add(&self, agent_id: Uuid, contact_address: &str, status: AgentStatus) {
        self.agents
            .write()
            .push((agent_id, contact_address.to_string(), status));
    }
}

impl Default for InMemoryAgentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentDirectory for InMemoryAgentDirectory {
    async fn find_available(&self) -> Result<Option<AvailableAgent>> {
        Ok(self
            .agents
            .read()
            .iter()
            .find(|(_, _, status)| *status == AgentStatus::Available)
            .map(|(agent_id, contact_address, _)| AvailableAgent {
                agent_id: *agent_id,
                contact_address: contact_address.clone(),
            }))
    }

    async fn set_status(&self, agent_id: Uuid, status: AgentStatus) -> Result<()> {
        let mut agents = self.agents.write();
        match agents.iter_mut().find(|(id, _, _)| *id == agent_id) {
            Some(entry) => {
                entry.2 = status;
                Ok(())
            },
            None => Err(
                PersistenceError::InvalidData(format!("Unknown agent {}", agent_id)).into(),
            ),
        }
    }
}
