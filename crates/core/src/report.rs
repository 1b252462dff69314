//! End-of-call report payloads
//!
//! The telephony vendor posts one of these after each call completes,
//! carrying vendor-computed aggregates (duration, cost breakdown, transcript).
//! It arrives after `call.ended`, so handling never depends on the in-memory
//! session still existing.

use serde::{Deserialize, Serialize};

/// Cost breakdown reported by the vendor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub stt: Option<f64>,
    pub llm: Option<f64>,
    pub tts: Option<f64>,
    pub vapi: Option<f64>,
    pub total: Option<f64>,
    pub llm_prompt_tokens: Option<i64>,
    pub llm_completion_tokens: Option<i64>,
    pub tts_characters: Option<i64>,
}

/// One transcript message from the report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMessage {
    pub role: String,
    pub message: Option<String>,
    pub seconds_from_start: Option<f64>,
    pub duration: Option<f64>,
}

impl ReportMessage {
    /// Only messages with actual content get stored
    pub fn has_content(&self) -> bool {
        self.message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Customer info attached to the report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportCustomer {
    pub number: Option<String>,
    pub name: Option<String>,
}

/// Variable values the vendor threads through from assistant config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportVariables {
    pub language: Option<String>,
}

/// Transcriber section of the assistant config echoed in the report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportTranscriber {
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportAssistant {
    pub transcriber: Option<ReportTranscriber>,
}

/// Vendor end-of-call report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReport {
    /// Vendor call id
    pub id: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub ended_reason: Option<String>,
    pub duration_seconds: Option<f64>,
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<ReportCustomer>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
    pub cost: Option<f64>,
    #[serde(default)]
    pub cost_breakdown: Option<CostBreakdown>,
    #[serde(default)]
    pub messages: Vec<ReportMessage>,
    #[serde(default)]
    pub assistant: Option<ReportAssistant>,
    #[serde(default)]
    pub variable_values: Option<ReportVariables>,
}

impl CallReport {
    /// Language for the call, checked in the locations the vendor may use
    pub fn language(&self) -> &str {
        self.variable_values
            .as_ref()
            .and_then(|v| v.language.as_deref())
            .or_else(|| {
                self.assistant
                    .as_ref()
                    .and_then(|a| a.transcriber.as_ref())
                    .and_then(|t| t.language.as_deref())
            })
            .unwrap_or("en-US")
    }

    /// Total cost, preferring the top-level figure
    pub fn total_cost(&self) -> Option<f64> {
        self.cost
            .or_else(|| self.cost_breakdown.as_ref().and_then(|b| b.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_prefers_variable_values() {
        let report: CallReport = serde_json::from_value(serde_json::json!({
            "id": "call_1",
            "variableValues": { "language": "ar-SA" },
            "assistant": { "transcriber": { "language": "en-US" } },
        }))
        .unwrap();
        assert_eq!(report.language(), "ar-SA");
    }

    #[test]
    fn language_defaults_when_absent() {
        let report: CallReport =
            serde_json::from_value(serde_json::json!({ "id": "call_2" })).unwrap();
        assert_eq!(report.language(), "en-US");
    }

    #[test]
    fn deserializes_vendor_report() {
        let report: CallReport = serde_json::from_value(serde_json::json!({
            "id": "call_3",
            "startedAt": "2025-01-01T00:00:00Z",
            "endedAt": "2025-01-01T00:05:00Z",
            "durationSeconds": 300.0,
            "cost": 0.42,
            "costBreakdown": { "stt": 0.1, "llm": 0.2, "tts": 0.1, "total": 0.42 },
            "messages": [
                { "role": "user", "message": "hello", "secondsFromStart": 1.5 },
                { "role": "assistant", "message": "" },
            ],
        }))
        .unwrap();
        assert_eq!(report.total_cost(), Some(0.42));
        assert_eq!(report.messages.len(), 2);
        assert!(report.messages[0].has_content());
        assert!(!report.messages[1].has_content());
    }
}
