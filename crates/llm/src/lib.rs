//! Text generation with confidence scoring
//!
//! Wraps an OpenAI-compatible chat backend behind a structured output
//! contract `{response, confidence}` with a parse-tolerant fallback: the
//! voice channel must always receive a playable utterance.

pub mod backend;
pub mod scored;

pub use backend::{ChatBackend, ChatMessage, ChatRole, LlmBackendConfig, OpenAiChatBackend};
pub use scored::{build_system_instruction, parse_scored, ScoredGenerator, ScoredReply};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for zoid_core::Error {
    fn from(err: LlmError) -> Self {
        zoid_core::Error::Generation(err.to_string())
    }
}
