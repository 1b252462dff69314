//! Settings structures and loading

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub escalation: EscalationConfig,

    #[serde(default)]
    pub telephony: TelephonyConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret expected as `Authorization: Bearer <token>` on webhooks
    #[serde(default = "default_webhook_token")]
    pub webhook_token: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3100
}

fn default_webhook_token() -> String {
    std::env::var("ZOID_WEBHOOK_TOKEN").unwrap_or_else(|_| "vapi-test-token-zoid".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_token: default_webhook_token(),
            log_json: false,
        }
    }
}

/// Call session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Most-recent-N turns retained per call
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Sessions not explicitly ended are force-expired after this many seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,

    /// Interval for the background expiry sweep
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_history_limit() -> usize {
    10
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// A seed knowledge chunk for the in-memory fallback store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub content: String,
    #[serde(default = "default_chunk_language")]
    pub language: String,
}

fn default_chunk_language() -> String {
    "en-US".to_string()
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Embedding API endpoint (Ollama-compatible)
    #[serde(default = "default_embedding_endpoint")]
    pub embedding_endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Qdrant endpoint; empty disables Qdrant and uses the in-memory store
    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,

    #[serde(default = "default_collection")]
    pub qdrant_collection: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Retrieval cache capacity (entries)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Retrieval cache entry TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Timeout for each embedding/search call
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,

    /// Seed chunks for the in-memory fallback knowledge base
    #[serde(default)]
    pub knowledge_chunks: Vec<KnowledgeChunk>,
}

fn default_embedding_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_qdrant_endpoint() -> String {
    String::new()
}

fn default_collection() -> String {
    "zoid_knowledge".to_string()
}

fn default_top_k() -> usize {
    2
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_retrieval_timeout() -> u64 {
    5
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_endpoint: default_embedding_endpoint(),
            embedding_model: default_embedding_model(),
            qdrant_endpoint: default_qdrant_endpoint(),
            qdrant_collection: default_collection(),
            top_k: default_top_k(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl(),
            timeout_secs: default_retrieval_timeout(),
            knowledge_chunks: Vec::new(),
        }
    }
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_llm_model() -> String {
    "qwen3:4b-instruct-2507-q4_K_M".to_string()
}

fn default_max_tokens() -> usize {
    256
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u64 {
    10
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Escalation decision and executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Confidence below this threshold escalates
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Calls longer than this escalate regardless of confidence
    #[serde(default = "default_max_call_duration")]
    pub max_call_duration_secs: u64,

    /// Case-insensitive phrases that escalate immediately
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Mark the selected agent busy when handing off a call
    #[serde(default = "default_true")]
    pub mark_agent_busy: bool,
}

fn default_confidence_threshold() -> f32 {
    0.6
}

fn default_max_call_duration() -> u64 {
    600
}

fn default_keywords() -> Vec<String> {
    [
        "talk to a human",
        "speak to manager",
        "speak to a supervisor",
        "human agent",
        "transfer me",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_call_duration_secs: default_max_call_duration(),
            keywords: default_keywords(),
            mark_agent_busy: default_true(),
        }
    }
}

/// Telephony vendor API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelephonyConfig {
    /// Vendor REST API base URL
    #[serde(default = "default_telephony_endpoint")]
    pub endpoint: String,

    /// Vendor API key; empty disables real transfers (they are logged and
    /// reported as failed)
    #[serde(default = "default_telephony_api_key")]
    pub api_key: String,

    #[serde(default = "default_telephony_timeout")]
    pub timeout_secs: u64,
}

fn default_telephony_endpoint() -> String {
    "https://api.vapi.ai".to_string()
}

fn default_telephony_api_key() -> String {
    std::env::var("VAPI_API_KEY").unwrap_or_default()
}

fn default_telephony_timeout() -> u64 {
    10
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_telephony_endpoint(),
            api_key: default_telephony_api_key(),
            timeout_secs: default_telephony_timeout(),
        }
    }
}

/// ScyllaDB persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory stores only)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "zoid_support".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate cross-field constraints the type system can't express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.escalation.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "escalation.confidence_threshold must be in [0, 1], got {}",
                self.escalation.confidence_threshold
            )));
        }
        if self.session.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "session.history_limit must be at least 1".to_string(),
            ));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::Invalid(
                "rag.top_k must be at least 1".to_string(),
            ));
        }
        if self.server.webhook_token.is_empty() {
            return Err(ConfigError::Invalid(
                "server.webhook_token must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings with layering: defaults < default.yaml < {env}.yaml < env vars
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if Path::new("config/default.yaml").exists() {
        builder = builder.add_source(File::with_name("config/default"));
    }

    if let Some(env_name) = env {
        let env_path = format!("config/{}", env_name);
        if Path::new(&format!("{}.yaml", env_path)).exists() {
            builder = builder.add_source(File::with_name(&env_path));
        } else {
            tracing::warn!(env = env_name, "Environment config file not found, skipping");
        }
    }

    // ZOID__SERVER__PORT=8080 style overrides
    builder = builder.add_source(Environment::with_prefix("ZOID").separator("__"));

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.escalation.confidence_threshold, 0.6);
        assert_eq!(settings.escalation.max_call_duration_secs, 600);
        assert_eq!(settings.session.history_limit, 10);
        assert_eq!(settings.rag.top_k, 2);
    }

    #[test]
    fn default_keywords_include_explicit_requests() {
        let settings = Settings::default();
        assert!(settings
            .escalation
            .keywords
            .iter()
            .any(|k| k == "talk to a human"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut settings = Settings::default();
        settings.escalation.confidence_threshold = 1.5;
        assert!(settings.validate().is_err());
    }
}
