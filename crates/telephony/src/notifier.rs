//! Agent notification
//!
//! Notification is best-effort and never gates a transfer. The log notifier
//! writes a structured alert; an SMS or chat integration would implement the
//! same trait.

use async_trait::async_trait;
use uuid::Uuid;

use zoid_core::{AgentNotifier, Result};

/// Notifier that emits a structured log alert
pub struct LogNotifier;

#[async_trait]
impl AgentNotifier for LogNotifier {
    async fn notify(&self, agent_id: Uuid, call_id: &str, reason: &str) -> Result<()> {
        tracing::info!(
            agent_id = %agent_id,
            call_id = %call_id,
            reason = %reason,
            "Escalation alert sent to agent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_never_fails() {
        let notifier = LogNotifier;
        assert!(notifier
            .notify(Uuid::new_v4(), "call_1", "low confidence")
            .await
            .is_ok());
    }
}
