//! Shared application state

use std::sync::Arc;

use zoid_agent::SupportAgent;
use zoid_core::CallLogStore;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<SupportAgent>,
    pub call_logs: Arc<dyn CallLogStore>,
    /// Shared secret expected on every webhook request
    pub webhook_token: Arc<str>,
}

impl AppState {
    pub fn new(
        agent: Arc<SupportAgent>,
        call_logs: Arc<dyn CallLogStore>,
        webhook_token: &str,
    ) -> Self {
        Self {
            agent,
            call_logs,
            webhook_token: Arc::from(webhook_token),
        }
    }
}
