//! Traits for the external capabilities the orchestration core consumes
//!
//! Everything past these seams (embedding model, vector index, telephony
//! signaling, relational store) is an external collaborator. The core only
//! depends on these contracts, so implementations can be swapped without
//! touching call sites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::language::Language;
use crate::report::CallReport;

/// Text embedding capability
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text into a dense vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A ranked text snippet from similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub content: String,
    /// Similarity score, higher is more similar
    pub score: f32,
}

/// Vector similarity search capability, scoped by language
#[async_trait]
pub trait SnippetSearch: Send + Sync {
    /// Return the top-`k` snippets most similar to `vector`, restricted to
    /// documents tagged with `language`, ordered by descending similarity.
    async fn search(&self, vector: &[f32], k: usize, language: Language) -> Result<Vec<Snippet>>;
}

/// External call-transfer capability (telephony vendor)
#[async_trait]
pub trait CallTransfer: Send + Sync {
    /// Transfer the live call to `destination`. The returned boolean is the
    /// vendor's authoritative success/failure result.
    async fn transfer(&self, call_id: &str, destination: &str) -> Result<bool>;
}

/// Human agent availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Available,
    Busy,
    Offline,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "available" => Self::Available,
            "busy" => Self::Busy,
            _ => Self::Offline,
        }
    }
}

/// An agent selected for escalation
#[derive(Debug, Clone)]
pub struct AvailableAgent {
    pub agent_id: Uuid,
    /// Where to transfer the call (phone number or SIP address)
    pub contact_address: String,
}

/// Human agent directory (external; status mutation happens elsewhere except
/// for the busy transition on escalation)
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Find one agent with status `available`. Any qualifying agent will do.
    async fn find_available(&self) -> Result<Option<AvailableAgent>>;

    /// Update an agent's status. Used to mark the selected agent busy when a
    /// call is handed off.
    async fn set_status(&self, agent_id: Uuid, status: AgentStatus) -> Result<()>;
}

/// Best-effort agent notification (SMS, push, dashboard)
#[async_trait]
pub trait AgentNotifier: Send + Sync {
    async fn notify(&self, agent_id: Uuid, call_id: &str, reason: &str) -> Result<()>;
}

/// Persisted escalation record
///
/// Resolution fields stay empty here; an external agent-facing workflow
/// resolves records later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub escalation_id: Uuid,
    pub call_id: String,
    pub reason: String,
    pub confidence_score: Option<f32>,
    pub agent_id: Uuid,
    pub escalated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl EscalationRecord {
    pub fn new(
        call_id: impl Into<String>,
        reason: impl Into<String>,
        confidence_score: Option<f32>,
        agent_id: Uuid,
    ) -> Self {
        Self {
            escalation_id: Uuid::new_v4(),
            call_id: call_id.into(),
            reason: reason.into(),
            confidence_score,
            agent_id,
            escalated_at: Utc::now(),
            resolved_at: None,
            resolution_notes: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Escalation record persistence
#[async_trait]
pub trait EscalationStore: Send + Sync {
    async fn insert(&self, record: &EscalationRecord) -> Result<()>;

    /// Whether an unresolved escalation already exists for this call.
    /// The executor must not double-escalate a call in an open escalation.
    async fn has_open(&self, call_id: &str) -> Result<bool>;
}

/// End-of-call report persistence
#[async_trait]
pub trait CallLogStore: Send + Sync {
    /// Persist the vendor report and its per-message transcript.
    /// Returns the stored log id and the number of messages stored.
    async fn insert(&self, report: &CallReport) -> Result<(Uuid, usize)>;
}
