//! Per-turn orchestration
//!
//! One transcription event runs the full pipeline under the call's session
//! lock: retrieve context, append the user turn, generate a scored reply,
//! run the escalation decision, and either answer or hand off. The lock is
//! held through the escalation hand-off too, so the next turn for a call
//! cannot start while this turn's executor is still mid-flight; rapid
//! duplicate low-confidence turns see the first turn's escalation record
//! instead of racing past the open-escalation guard. Only that one call
//! waits on the telephony round trip.

use std::sync::Arc;
use std::time::Instant;

use zoid_core::{Error, Language, Result, Turn};
use zoid_llm::ScoredGenerator;
use zoid_rag::ContextRetriever;

use crate::escalation::EscalationEngine;
use crate::executor::{EscalationExecutor, EscalationOutcome};
use crate::session::CallSessionStore;

/// Timing and quality signals for one answered turn
#[derive(Debug, Clone, Copy)]
pub struct TurnMetrics {
    pub rag_ms: u128,
    pub ai_ms: u128,
    pub total_ms: u128,
    pub confidence: f32,
}

/// Result of processing one transcription event
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// Empty or whitespace-only transcript; nothing to say
    Silence,
    /// A normal answered turn
    Reply {
        response: String,
        language: Language,
        context: Vec<String>,
        metrics: TurnMetrics,
    },
    /// The turn triggered escalation; `response` is what the caller hears
    Escalation {
        response: String,
        language: Language,
        transferred: bool,
    },
}

impl TurnOutcome {
    /// The utterance to speak, if any
    pub fn response(&self) -> Option<&str> {
        match self {
            TurnOutcome::Silence => None,
            TurnOutcome::Reply { response, .. } => Some(response),
            TurnOutcome::Escalation { response, .. } => Some(response),
        }
    }
}

/// The voice support agent: session store, retrieval, generation, and
/// escalation wired into one per-turn pipeline.
pub struct SupportAgent {
    store: Arc<CallSessionStore>,
    retriever: Arc<ContextRetriever>,
    generator: ScoredGenerator,
    engine: EscalationEngine,
    executor: Arc<EscalationExecutor>,
}

impl SupportAgent {
    pub fn new(
        store: Arc<CallSessionStore>,
        retriever: Arc<ContextRetriever>,
        generator: ScoredGenerator,
        engine: EscalationEngine,
        executor: Arc<EscalationExecutor>,
    ) -> Self {
        Self {
            store,
            retriever,
            generator,
            engine,
            executor,
        }
    }

    pub fn store(&self) -> &CallSessionStore {
        &self.store
    }

    /// Handle `call.started`: create the session and return the greeting.
    pub fn handle_call_started(&self, call_id: &str, language_code: &str) -> (Language, String) {
        let language = Language::parse_or_default(language_code);
        self.store.create(call_id, language);
        (language, language.greeting().to_string())
    }

    /// Handle a final user transcription for an active call.
    ///
    /// Fails with `Error::StateNotFound` when the call has no live session;
    /// a session is never created implicitly for an unknown call.
    pub async fn handle_transcription(&self, call_id: &str, transcript: &str) -> Result<TurnOutcome> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Ok(TurnOutcome::Silence);
        }

        let turn_started = Instant::now();

        let handle = self
            .store
            .get(call_id)
            .await
            .ok_or_else(|| Error::StateNotFound(call_id.to_string()))?;

        // Hold the session lock for the whole turn so duplicate events for
        // the same call serialize instead of interleaving their appends.
        let mut session = handle.lock().await;
        let language = session.language;

        // Retrieve against the transcript before it joins the history, so the
        // query is the user's words alone.
        let rag_started = Instant::now();
        let context = self.retriever.retrieve(transcript, language).await?;
        let rag_ms = rag_started.elapsed().as_millis();

        session.push_turn(Turn::user(transcript), self.store.history_limit());

        let ai_started = Instant::now();
        let reply = self
            .generator
            .generate(&session.messages, language, &context)
            .await;
        let ai_ms = ai_started.elapsed().as_millis();

        let trigger = self
            .engine
            .decide(Some(&session), transcript, reply.confidence);

        if let Some(trigger) = trigger {
            tracing::info!(
                call_id = %call_id,
                reason = %trigger.reason,
                confidence = reply.confidence,
                "Turn triggered escalation"
            );

            // Still under the session lock: a concurrent turn for this call
            // must not reach the executor until this hand-off has recorded
            // its escalation.
            let outcome = self.executor.escalate(call_id, &trigger).await;
            let response = match outcome {
                EscalationOutcome::Transferred | EscalationOutcome::AlreadyEscalated => {
                    language.transfer_message().to_string()
                },
                EscalationOutcome::NoAgentAvailable => language.agents_busy_message().to_string(),
                EscalationOutcome::TransferFailed => language.apology().to_string(),
            };

            session.push_turn(
                Turn::assistant(response.clone()),
                self.store.history_limit(),
            );
            drop(session);

            return Ok(TurnOutcome::Escalation {
                response,
                language,
                transferred: outcome.is_transferred(),
            });
        }

        session.push_turn(
            Turn::assistant(reply.response.clone()),
            self.store.history_limit(),
        );
        drop(session);

        let metrics = TurnMetrics {
            rag_ms,
            ai_ms,
            total_ms: turn_started.elapsed().as_millis(),
            confidence: reply.confidence,
        };
        tracing::info!(
            call_id = %call_id,
            rag_ms = metrics.rag_ms as u64,
            ai_ms = metrics.ai_ms as u64,
            total_ms = metrics.total_ms as u64,
            confidence = metrics.confidence,
            "Turn completed"
        );

        Ok(TurnOutcome::Reply {
            response: reply.response,
            language,
            context,
            metrics,
        })
    }

    /// Handle `call.ended`: drop the session. Returns the final message
    /// count if the call was known.
    pub async fn handle_call_ended(&self, call_id: &str) -> Option<usize> {
        self.store.end(call_id).await
    }
}
