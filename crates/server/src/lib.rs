//! Webhook HTTP server
//!
//! The telephony vendor posts call lifecycle events here; everything else
//! (health, metrics) exists to operate the service. Handlers translate events
//! into `zoid-agent` calls and map outcomes back onto the vendor's expected
//! response shapes.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod state;
pub mod webhook;

pub use auth::auth_middleware;
pub use http::create_router;
pub use metrics::{init_metrics, record_escalation, record_turn_latency, record_webhook_event};
pub use state::AppState;
