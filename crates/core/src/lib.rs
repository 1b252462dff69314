//! Core types and traits for the Zoid voice support agent
//!
//! This crate provides the foundational types shared by all other crates:
//! - Call session and conversation turn types
//! - Supported languages, greetings, and system instructions
//! - Traits for the external capabilities this core orchestrates
//!   (embedding, vector search, call transfer, agent directory, persistence)
//! - The error taxonomy

pub mod call;
pub mod error;
pub mod language;
pub mod report;
pub mod traits;

pub use call::{CallSession, Turn, TurnRole};
pub use error::{Error, Result};
pub use language::Language;
pub use report::{CallReport, CostBreakdown, ReportMessage};
pub use traits::{
    AgentDirectory, AgentNotifier, AgentStatus, AvailableAgent, CallLogStore, CallTransfer,
    EscalationRecord, EscalationStore, Snippet, SnippetSearch, TextEmbedder,
};
