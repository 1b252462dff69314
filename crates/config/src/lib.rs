//! Layered configuration
//!
//! Priority: env vars (`ZOID__*`) > `config/{env}.yaml` > `config/default.yaml`
//! > serde defaults. Every section has workable defaults so the server boots
//! with no config files at all.

mod settings;

pub use settings::{
    load_settings, EscalationConfig, KnowledgeChunk, LlmSettings, PersistenceConfig, RagConfig,
    ServerConfig, SessionConfig, Settings, TelephonyConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
