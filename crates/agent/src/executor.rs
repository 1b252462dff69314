//! Escalation executor
//!
//! Runs the hand-off once the engine has decided to escalate: find an
//! available agent, record the escalation, optionally mark the agent busy,
//! notify them, and transfer the call. The telephony transfer result is the
//! only authoritative success signal; record/status/notify failures are
//! logged and do not abort the hand-off.

use std::sync::Arc;

use zoid_core::{
    AgentDirectory, AgentNotifier, AgentStatus, CallTransfer, EscalationRecord, EscalationStore,
};

use crate::escalation::EscalationTrigger;

/// Terminal result of an escalation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// The call was handed off to a human agent
    Transferred,
    /// No agent was available; the caller stays with the assistant
    NoAgentAvailable,
    /// An agent was selected but the telephony transfer failed
    TransferFailed,
    /// The call already has an unresolved escalation
    AlreadyEscalated,
}

impl EscalationOutcome {
    pub fn is_transferred(&self) -> bool {
        matches!(self, Self::Transferred)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transferred => "transferred",
            Self::NoAgentAvailable => "no_agent_available",
            Self::TransferFailed => "transfer_failed",
            Self::AlreadyEscalated => "already_escalated",
        }
    }
}

/// Escalation hand-off executor
pub struct EscalationExecutor {
    directory: Arc<dyn AgentDirectory>,
    escalations: Arc<dyn EscalationStore>,
    notifier: Arc<dyn AgentNotifier>,
    transfer: Arc<dyn CallTransfer>,
    mark_agent_busy: bool,
}

impl EscalationExecutor {
    pub fn new(
        directory: Arc<dyn AgentDirectory>,
        escalations: Arc<dyn EscalationStore>,
        notifier: Arc<dyn AgentNotifier>,
        transfer: Arc<dyn CallTransfer>,
        mark_agent_busy: bool,
    ) -> Self {
        Self {
            directory,
            escalations,
            notifier,
            transfer,
            mark_agent_busy,
        }
    }

    /// Execute one escalation attempt for a call.
    ///
    /// The open-record guard is check-then-act, so callers must serialize
    /// attempts per call id; the turn pipeline does this by holding the
    /// call's session lock across this method.
    pub async fn escalate(&self, call_id: &str, trigger: &EscalationTrigger) -> EscalationOutcome {
        tracing::info!(call_id = %call_id, reason = %trigger.reason, "Escalating call");

        match self.escalations.has_open(call_id).await {
            Ok(true) => {
                tracing::warn!(call_id = %call_id, "Call already has an open escalation");
                return EscalationOutcome::AlreadyEscalated;
            },
            Ok(false) => {},
            Err(e) => {
                // Store trouble must not strand the caller; proceed as if open
                // escalations were absent
                tracing::warn!(call_id = %call_id, error = %e, "Open-escalation check failed");
            },
        }

        let agent = match self.directory.find_available().await {
            Ok(Some(agent)) => agent,
            Ok(None) => {
                tracing::warn!(call_id = %call_id, "No available agents for escalation");
                return EscalationOutcome::NoAgentAvailable;
            },
            Err(e) => {
                tracing::error!(call_id = %call_id, error = %e, "Agent lookup failed");
                return EscalationOutcome::NoAgentAvailable;
            },
        };

        let record = EscalationRecord::new(
            call_id,
            trigger.reason.clone(),
            trigger.confidence_score,
            agent.agent_id,
        );
        if let Err(e) = self.escalations.insert(&record).await {
            tracing::error!(
                call_id = %call_id,
                escalation_id = %record.escalation_id,
                error = %e,
                "Failed to persist escalation record"
            );
        }

        if self.mark_agent_busy {
            if let Err(e) = self
                .directory
                .set_status(agent.agent_id, AgentStatus::Busy)
                .await
            {
                tracing::warn!(agent_id = %agent.agent_id, error = %e, "Failed to mark agent busy");
            }
        }

        if let Err(e) = self
            .notifier
            .notify(agent.agent_id, call_id, &trigger.reason)
            .await
        {
            tracing::warn!(agent_id = %agent.agent_id, error = %e, "Agent notification failed");
        }

        match self.transfer.transfer(call_id, &agent.contact_address).await {
            Ok(true) => {
                tracing::info!(
                    call_id = %call_id,
                    agent_id = %agent.agent_id,
                    "Call transferred to human agent"
                );
                EscalationOutcome::Transferred
            },
            Ok(false) => {
                tracing::error!(call_id = %call_id, agent_id = %agent.agent_id, "Transfer rejected");
                EscalationOutcome::TransferFailed
            },
            Err(e) => {
                tracing::error!(call_id = %call_id, error = %e, "Transfer request failed");
                EscalationOutcome::TransferFailed
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use uuid::Uuid;
    use zoid_core::{AvailableAgent, Error, Result};

    struct FakeDirectory {
        agent: Option<AvailableAgent>,
        statuses: Mutex<Vec<(Uuid, AgentStatus)>>,
    }

    impl FakeDirectory {
        fn with_agent() -> Self {
            Self {
                agent: Some(AvailableAgent {
                    agent_id: Uuid::new_v4(),
                    contact_address: "+15550100".to_string(),
                }),
                statuses: Mutex::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self {
                agent: None,
                statuses: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AgentDirectory for FakeDirectory {
        async fn find_available(&self) -> Result<Option<AvailableAgent>> {
            Ok(self.agent.clone())
        }

        async fn set_status(&self, agent_id: Uuid, status: AgentStatus) -> Result<()> {
            self.statuses.lock().push((agent_id, status));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeEscalations {
        records: Mutex<Vec<EscalationRecord>>,
        open: bool,
    }

    #[async_trait]
    impl EscalationStore for FakeEscalations {
        async fn insert(&self, record: &EscalationRecord) -> Result<()> {
            self.records.lock().push(record.clone());
            Ok(())
        }

        async fn has_open(&self, _call_id: &str) -> Result<bool> {
            Ok(self.open)
        }
    }

    struct FakeNotifier;

    #[async_trait]
    impl AgentNotifier for FakeNotifier {
        async fn notify(&self, _agent_id: Uuid, _call_id: &str, _reason: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FakeTransfer {
        result: Result<bool>,
    }

    #[async_trait]
    impl CallTransfer for FakeTransfer {
        async fn transfer(&self, _call_id: &str, _destination: &str) -> Result<bool> {
            match &self.result {
                Ok(v) => Ok(*v),
                Err(e) => Err(Error::Transfer(e.to_string())),
            }
        }
    }

    fn trigger() -> EscalationTrigger {
        EscalationTrigger {
            reason: "User explicitly requested to talk to a human".to_string(),
            confidence_score: None,
        }
    }

    fn executor(
        directory: FakeDirectory,
        escalations: FakeEscalations,
        transfer_result: Result<bool>,
    ) -> (EscalationExecutor, Arc<FakeEscalations>, Arc<FakeDirectory>) {
        let directory = Arc::new(directory);
        let escalations = Arc::new(escalations);
        let executor = EscalationExecutor::new(
            directory.clone(),
            escalations.clone(),
            Arc::new(FakeNotifier),
            Arc::new(FakeTransfer {
                result: transfer_result,
            }),
            true,
        );
        (executor, escalations, directory)
    }

    #[tokio::test]
    async fn successful_hand_off_records_and_marks_busy() {
        let (executor, escalations, directory) =
            executor(FakeDirectory::with_agent(), FakeEscalations::default(), Ok(true));

        let outcome = executor.escalate("c1", &trigger()).await;

        assert_eq!(outcome, EscalationOutcome::Transferred);
        let records = escalations.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].call_id, "c1");
        assert!(records[0].is_open());
        let statuses = directory.statuses.lock();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].1, AgentStatus::Busy);
    }

    #[tokio::test]
    async fn no_agent_means_no_record() {
        let (executor, escalations, _) =
            executor(FakeDirectory::empty(), FakeEscalations::default(), Ok(true));

        let outcome = executor.escalate("c1", &trigger()).await;

        assert_eq!(outcome, EscalationOutcome::NoAgentAvailable);
        assert!(escalations.records.lock().is_empty());
    }

    #[tokio::test]
    async fn transfer_rejection_is_reported_as_failure() {
        let (executor, escalations, _) = executor(
            FakeDirectory::with_agent(),
            FakeEscalations::default(),
            Ok(false),
        );

        let outcome = executor.escalate("c1", &trigger()).await;

        assert_eq!(outcome, EscalationOutcome::TransferFailed);
        // Record was still written; the attempt is auditable
        assert_eq!(escalations.records.lock().len(), 1);
    }

    #[tokio::test]
    async fn open_escalation_blocks_a_second_attempt() {
        let (executor, escalations, _) = executor(
            FakeDirectory::with_agent(),
            FakeEscalations {
                open: true,
                ..Default::default()
            },
            Ok(true),
        );

        let outcome = executor.escalate("c1", &trigger()).await;

        assert_eq!(outcome, EscalationOutcome::AlreadyEscalated);
        assert!(escalations.records.lock().is_empty());
    }

    #[tokio::test]
    async fn transfer_error_is_reported_as_failure() {
        let (executor, _, _) = executor(
            FakeDirectory::with_agent(),
            FakeEscalations::default(),
            Err(Error::Transfer("timeout".to_string())),
        );

        let outcome = executor.escalate("c1", &trigger()).await;
        assert_eq!(outcome, EscalationOutcome::TransferFailed);
    }

    #[tokio::test]
    async fn busy_flag_off_leaves_agent_status_alone() {
        let directory = Arc::new(FakeDirectory::with_agent());
        let executor = EscalationExecutor::new(
            directory.clone(),
            Arc::new(FakeEscalations::default()),
            Arc::new(FakeNotifier),
            Arc::new(FakeTransfer { result: Ok(true) }),
            false,
        );

        let outcome = executor.escalate("c1", &trigger()).await;
        assert_eq!(outcome, EscalationOutcome::Transferred);
        assert!(directory.statuses.lock().is_empty());
    }
}
