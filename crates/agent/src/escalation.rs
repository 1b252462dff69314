//! Escalation decision engine
//!
//! Pure decision logic over call state and the latest model confidence. The
//! rules are checked in fixed priority order; the first match wins and its
//! reason string is the one persisted and shown to agents.
//!
//! Priority: missing call state, explicit keyword request, low confidence,
//! call duration. A caller who asks for a human gets one even when the model
//! is fully confident.

use serde::Serialize;

use zoid_config::EscalationConfig;
use zoid_core::CallSession;

/// A decision to escalate, with the agent-facing reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationTrigger {
    pub reason: String,
    /// Set only for confidence-triggered escalations
    pub confidence_score: Option<f32>,
}

impl EscalationTrigger {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            confidence_score: None,
        }
    }
}

/// Rule-based escalation decision engine
pub struct EscalationEngine {
    config: EscalationConfig,
}

impl EscalationEngine {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Decide whether this turn escalates.
    ///
    /// `session` is the call's state if it exists, `latest_user_message` the
    /// transcript just received, and `latest_confidence` the score attached
    /// to the reply generated this turn.
    pub fn decide(
        &self,
        session: Option<&CallSession>,
        latest_user_message: &str,
        latest_confidence: f32,
    ) -> Option<EscalationTrigger> {
        let Some(session) = session else {
            // A call we have no state for cannot be handled by the model
            return Some(EscalationTrigger::new("Call state not found"));
        };

        let lowered = latest_user_message.to_lowercase();
        if let Some(phrase) = self
            .config
            .keywords
            .iter()
            .find(|k| lowered.contains(k.to_lowercase().as_str()))
        {
            return Some(EscalationTrigger::new(format!(
                "User explicitly requested to {}",
                phrase
            )));
        }

        if latest_confidence < self.config.confidence_threshold {
            return Some(EscalationTrigger {
                reason: format!(
                    "AI confidence score ({:.2}) is below threshold ({})",
                    latest_confidence, self.config.confidence_threshold
                ),
                confidence_score: Some(latest_confidence),
            });
        }

        let duration = session.duration_seconds();
        if duration > self.config.max_call_duration_secs as i64 {
            return Some(EscalationTrigger::new(format!(
                "Call duration exceeded {} minutes",
                self.config.max_call_duration_secs / 60
            )));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use zoid_core::Language;

    fn engine() -> EscalationEngine {
        EscalationEngine::new(EscalationConfig::default())
    }

    fn session() -> CallSession {
        CallSession::new("c1", Language::EnUs)
    }

    #[test]
    fn missing_session_escalates() {
        let trigger = engine().decide(None, "hello", 0.9).expect("escalates");
        assert_eq!(trigger.reason, "Call state not found");
        assert_eq!(trigger.confidence_score, None);
    }

    #[test]
    fn keyword_escalates_even_at_full_confidence() {
        let s = session();
        let trigger = engine()
            .decide(Some(&s), "I want to TALK TO A HUMAN please", 1.0)
            .expect("escalates");
        assert_eq!(trigger.reason, "User explicitly requested to talk to a human");
        assert_eq!(trigger.confidence_score, None);
    }

    #[test]
    fn low_confidence_escalates_with_score_attached() {
        let s = session();
        let trigger = engine()
            .decide(Some(&s), "how do I export my data?", 0.3)
            .expect("escalates");
        assert!(trigger.reason.contains("0.30"));
        assert!(trigger.reason.contains("below threshold (0.6)"));
        assert_eq!(trigger.confidence_score, Some(0.3));
    }

    #[test]
    fn confidence_at_threshold_does_not_escalate() {
        let s = session();
        assert!(engine().decide(Some(&s), "thanks", 0.6).is_none());
    }

    #[test]
    fn long_call_escalates_despite_high_confidence() {
        let mut s = session();
        s.start_time = s.start_time - Duration::seconds(601);
        let trigger = engine()
            .decide(Some(&s), "one more question", 0.9)
            .expect("escalates");
        assert_eq!(trigger.reason, "Call duration exceeded 10 minutes");
    }

    #[test]
    fn normal_turn_does_not_escalate() {
        let s = session();
        assert!(engine()
            .decide(Some(&s), "how do I reset my password?", 0.85)
            .is_none());
    }

    #[test]
    fn keyword_outranks_low_confidence_for_the_reason_string() {
        let s = session();
        let trigger = engine()
            .decide(Some(&s), "transfer me now", 0.1)
            .expect("escalates");
        assert!(trigger.reason.starts_with("User explicitly requested"));
        assert_eq!(trigger.confidence_score, None);
    }
}
