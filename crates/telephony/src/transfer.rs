//! Live-call transfer via the vendor control API

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use zoid_config::TelephonyConfig;
use zoid_core::{CallTransfer, Result};

use crate::TelephonyError;

#[derive(Debug, Serialize)]
struct TransferDestination<'a> {
    #[serde(rename = "type")]
    destination_type: &'static str,
    number: &'a str,
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    destination: TransferDestination<'a>,
}

/// Vapi-style call transfer client
///
/// Without an API key the client stays in dry-run mode: transfer attempts are
/// logged and reported as failed, so development setups degrade to the
/// agents-busy path instead of erroring.
pub struct VapiTransferClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl VapiTransferClient {
    pub fn new(config: &TelephonyConfig) -> std::result::Result<Self, TelephonyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TelephonyError::Network(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn transfer_url(&self, call_id: &str) -> String {
        format!("{}/call/{}/transfer", self.endpoint, call_id)
    }
}

#[async_trait]
impl CallTransfer for VapiTransferClient {
    async fn transfer(&self, call_id: &str, destination: &str) -> Result<bool> {
        if self.api_key.is_empty() {
            tracing::warn!(
                call_id = %call_id,
                destination = %destination,
                "No telephony API key configured, transfer skipped"
            );
            return Ok(false);
        }

        let request = TransferRequest {
            destination: TransferDestination {
                destination_type: "number",
                number: destination,
            },
        };

        let response = self
            .client
            .post(self.transfer_url(call_id))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(TelephonyError::from)?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(call_id = %call_id, "Transfer accepted by vendor");
            Ok(true)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                call_id = %call_id,
                status = %status,
                body = %body,
                "Transfer rejected by vendor"
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_without_api_key_reports_failure() {
        let client = VapiTransferClient::new(&TelephonyConfig {
            endpoint: "https://api.vapi.ai".to_string(),
            api_key: String::new(),
            timeout_secs: 1,
        })
        .unwrap();

        let transferred = client.transfer("call_1", "+15550100").await.unwrap();
        assert!(!transferred);
    }

    #[test]
    fn transfer_url_is_scoped_to_the_call() {
        let client = VapiTransferClient::new(&TelephonyConfig {
            endpoint: "https://api.vapi.ai/".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(
            client.transfer_url("call_1"),
            "https://api.vapi.ai/call/call_1/transfer"
        );
    }
}
