//! Telephony vendor integration
//!
//! The vendor owns the phone leg: STT, TTS, call routing, and live-call
//! control. This crate speaks its REST API for the one control operation the
//! agent needs (transferring a live call to a human) and carries the
//! agent-notification channel.

pub mod notifier;
pub mod transfer;

pub use notifier::LogNotifier;
pub use transfer::VapiTransferClient;

use thiserror::Error;

/// Telephony errors
#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for TelephonyError {
    fn from(err: reqwest::Error) -> Self {
        TelephonyError::Network(err.to_string())
    }
}

impl From<TelephonyError> for zoid_core::Error {
    fn from(err: TelephonyError) -> Self {
        zoid_core::Error::Transfer(err.to_string())
    }
}
