//! ScyllaDB schema creation

use scylla::Session;

use crate::error::PersistenceError;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::Schema(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    // Agent registry, keyed by id. Status changes go here and to the
    // availability partition below.
    let agents_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.support_agents (
            agent_id UUID,
            name TEXT,
            contact_address TEXT,
            status TEXT,
            updated_at TIMESTAMP,
            PRIMARY KEY (agent_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(agents_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::Schema(format!("Failed to create support_agents table: {}", e))
        })?;

    // Availability lookup partitioned by status, so find-available is a
    // single-partition read instead of a filtered scan
    let agents_by_status_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.agents_by_status (
            status TEXT,
            agent_id UUID,
            contact_address TEXT,
            PRIMARY KEY ((status), agent_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(agents_by_status_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::Schema(format!("Failed to create agents_by_status table: {}", e))
        })?;

    // Escalations partitioned by call id; the open-escalation check reads one
    // partition
    let escalations_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.escalations (
            call_id TEXT,
            escalation_id UUID,
            reason TEXT,
            confidence_score FLOAT,
            agent_id UUID,
            escalated_at TIMESTAMP,
            resolved_at TIMESTAMP,
            resolution_notes TEXT,
            PRIMARY KEY ((call_id), escalation_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(escalations_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::Schema(format!("Failed to create escalations table: {}", e))
        })?;

    // End-of-call reports
    let call_logs_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.call_logs (
            log_id UUID,
            call_id TEXT,
            started_at TEXT,
            ended_at TEXT,
            ended_reason TEXT,
            duration_seconds DOUBLE,
            status TEXT,
            customer_number TEXT,
            language TEXT,
            summary TEXT,
            recording_url TEXT,
            cost DOUBLE,
            message_count INT,
            created_at TIMESTAMP,
            PRIMARY KEY (log_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(call_logs_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::Schema(format!("Failed to create call_logs table: {}", e))
        })?;

    // Per-message transcript rows, clustered in spoken order
    let call_log_messages_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.call_log_messages (
            log_id UUID,
            seq INT,
            role TEXT,
            content TEXT,
            seconds_from_start DOUBLE,
            PRIMARY KEY ((log_id), seq)
        ) WITH CLUSTERING ORDER BY (seq ASC)
    "#,
        keyspace
    );

    session
        .query_unpaged(call_log_messages_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::Schema(format!("Failed to create call_log_messages table: {}", e))
        })?;

    tracing::info!("All tables created successfully");
    Ok(())
}
