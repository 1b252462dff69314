//! Confidence-scored generation
//!
//! The model is instructed to emit `{"response": "...", "confidence": 0.0-1.0}`.
//! Parse failures and backend failures recover locally to a safe sentinel:
//! they must never crash a turn, and must never be mistaken for high
//! confidence. A malformed confidence value on an otherwise good reply
//! defaults to 0.5 so format problems stay distinguishable from genuinely
//! low-confidence answers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use zoid_core::{Language, Turn, TurnRole};

use crate::backend::{ChatBackend, ChatMessage};

/// Appended to every system instruction to request the structured shape
const STRUCTURED_OUTPUT_CONTRACT: &str = "\
Respond with a single JSON object and nothing else, in exactly this shape:
{\"response\": \"<what you would say to the caller>\", \"confidence\": <number from 0.0 to 1.0>}
The confidence number is your estimate of how completely the provided context \
answers the caller's question.";

static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("static regex"));

/// A generated reply with the model's confidence estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReply {
    pub response: String,
    /// In [0, 1]; 0.0 marks the parse-failure sentinel
    pub confidence: f32,
}

impl ScoredReply {
    /// Sentinel for unusable model output
    pub fn fallback(apology: &str) -> Self {
        Self {
            response: apology.to_string(),
            confidence: 0.0,
        }
    }
}

/// Build the full system instruction: language persona, retrieved context,
/// voice-call brevity, and the structured output contract.
pub fn build_system_instruction(language: Language, context: &[String]) -> String {
    format!(
        "{}\n\nCONTEXT:\n---\n{}\n---\n\nIMPORTANT: Keep your response concise for phone \
         conversations. Maximum 2-3 sentences.\n\n{}",
        language.system_instruction(),
        context.join("\n---\n"),
        STRUCTURED_OUTPUT_CONTRACT
    )
}

/// Parse raw model output into a `ScoredReply`.
///
/// - No parseable JSON object, or no usable response text: sentinel
///   `{apology, 0.0}`.
/// - Valid response text but missing/non-numeric/out-of-range confidence:
///   the response is kept with confidence 0.5.
pub fn parse_scored(raw: &str, apology: &str) -> ScoredReply {
    let Some(json_match) = JSON_BLOCK.find(raw) else {
        tracing::warn!("Model output contained no JSON object");
        return ScoredReply::fallback(apology);
    };

    let parsed: serde_json::Value = match serde_json::from_str(json_match.as_str()) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse model JSON output");
            return ScoredReply::fallback(apology);
        },
    };

    let response = parsed
        .get("response")
        .or_else(|| parsed.get("text"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let Some(response) = response else {
        tracing::warn!("Model JSON output had no response field");
        return ScoredReply::fallback(apology);
    };

    let confidence = match parsed.get("confidence").and_then(|v| v.as_f64()) {
        Some(c) if (0.0..=1.0).contains(&c) => c as f32,
        other => {
            tracing::warn!(value = ?other, "Invalid confidence in model output, defaulting to 0.5");
            0.5
        },
    };

    ScoredReply {
        response: response.to_string(),
        confidence,
    }
}

/// Confidence-scored response generator
pub struct ScoredGenerator {
    backend: Arc<dyn ChatBackend>,
}

impl ScoredGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Generate a scored reply from the conversation and retrieved context.
    ///
    /// Infallible by contract: backend or parse failures fall back to the
    /// language-appropriate apology with confidence 0.0.
    pub async fn generate(
        &self,
        turns: &[Turn],
        language: Language,
        context: &[String],
    ) -> ScoredReply {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatMessage::system(build_system_instruction(
            language, context,
        )));
        messages.extend(turns.iter().map(|turn| match turn.role {
            TurnRole::User => ChatMessage::user(turn.content.clone()),
            TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
        }));

        match self.backend.chat(&messages).await {
            Ok(raw) => parse_scored(&raw, language.apology()),
            Err(e) => {
                tracing::error!(
                    model = self.backend.model_name(),
                    error = %e,
                    "Generation call failed"
                );
                ScoredReply::fallback(language.apology())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LlmError;
    use async_trait::async_trait;

    const APOLOGY: &str = "sorry, try again";

    #[test]
    fn parses_valid_structured_output() {
        let reply = parse_scored(
            r#"{"response": "Go to Settings and click Change Password.", "confidence": 0.92}"#,
            APOLOGY,
        );
        assert_eq!(reply.response, "Go to Settings and click Change Password.");
        assert!((reply.confidence - 0.92).abs() < 1e-6);
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = "Here is my answer:\n{\"response\": \"Premium includes priority support.\", \"confidence\": 0.8}\nDone.";
        let reply = parse_scored(raw, APOLOGY);
        assert_eq!(reply.response, "Premium includes priority support.");
    }

    #[test]
    fn invalid_json_falls_back_to_apology_with_zero_confidence() {
        let reply = parse_scored("I am not JSON at all", APOLOGY);
        assert_eq!(reply.response, APOLOGY);
        assert_eq!(reply.confidence, 0.0);
    }

    #[test]
    fn missing_response_field_is_a_parse_failure() {
        let reply = parse_scored(r#"{"confidence": 0.9}"#, APOLOGY);
        assert_eq!(reply.response, APOLOGY);
        assert_eq!(reply.confidence, 0.0);
    }

    #[test]
    fn out_of_range_confidence_defaults_to_medium() {
        let reply = parse_scored(r#"{"response": "ok", "confidence": 3.5}"#, APOLOGY);
        assert_eq!(reply.response, "ok");
        assert_eq!(reply.confidence, 0.5);
    }

    #[test]
    fn non_numeric_confidence_defaults_to_medium() {
        let reply = parse_scored(r#"{"response": "ok", "confidence": "high"}"#, APOLOGY);
        assert_eq!(reply.response, "ok");
        assert_eq!(reply.confidence, 0.5);
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Err(LlmError::Api("backend down".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn backend_failure_yields_apology_sentinel() {
        let generator = ScoredGenerator::new(Arc::new(FailingBackend));
        let reply = generator
            .generate(&[Turn::user("hello")], Language::EnUs, &[])
            .await;
        assert_eq!(reply.response, Language::EnUs.apology());
        assert_eq!(reply.confidence, 0.0);
    }

    #[test]
    fn system_instruction_embeds_context_and_contract() {
        let instruction = build_system_instruction(
            Language::EnUs,
            &["chunk one".to_string(), "chunk two".to_string()],
        );
        assert!(instruction.contains("chunk one\n---\nchunk two"));
        assert!(instruction.contains("\"confidence\""));
    }
}
