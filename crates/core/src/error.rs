//! Error taxonomy
//!
//! Every failure class the webhook layer needs to distinguish gets its own
//! variant, inspected structurally rather than by downcasting.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid webhook credential. Rejected before any processing.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Missing or malformed request fields.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Event references a call with no active session.
    #[error("Call state not found: {0}")]
    StateNotFound(String),

    /// Embedding or vector search failure.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Text generation failure (transport-level; parse failures recover locally).
    #[error("Generation error: {0}")]
    Generation(String),

    /// Escalation bookkeeping failure.
    #[error("Escalation error: {0}")]
    Escalation(String),

    /// External call-transfer capability failure.
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// External store failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias using the core error
pub type Result<T> = std::result::Result<T, Error>;
