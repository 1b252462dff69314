//! End-to-end call flow against stubbed retrieval and generation backends,
//! including the per-call ordering guarantee under concurrent events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use zoid_agent::{
    CallSessionStore, EscalationEngine, EscalationExecutor, SupportAgent, TurnOutcome,
};
use zoid_config::EscalationConfig;
use zoid_core::{
    AgentDirectory, AgentNotifier, AgentStatus, AvailableAgent, CallTransfer, EscalationRecord,
    EscalationStore, Language, Result, Snippet, SnippetSearch, TextEmbedder, TurnRole,
};
use zoid_llm::{ChatBackend, ChatMessage, LlmError, ScoredGenerator};
use zoid_rag::{ContextRetriever, RetrievalCache, RetrieverConfig};

struct UnitEmbedder;

#[async_trait]
impl TextEmbedder for UnitEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

struct FixedSearch;

#[async_trait]
impl SnippetSearch for FixedSearch {
    async fn search(&self, _vector: &[f32], _k: usize, _language: Language) -> Result<Vec<Snippet>> {
        Ok(vec![Snippet {
            content: "Refunds are processed within 5 business days.".to_string(),
            score: 0.8,
        }])
    }
}

/// Backend that echoes the last user message after a short delay, so
/// concurrent turns would interleave if they were not serialized.
struct SlowEchoBackend;

#[async_trait]
impl ChatBackend for SlowEchoBackend {
    async fn chat(&self, messages: &[ChatMessage]) -> std::result::Result<String, LlmError> {
        tokio::time::sleep(Duration::from_millis(30)).await;
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, zoid_llm::ChatRole::User))
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(format!(
            r#"{{"response": "echo: {}", "confidence": 0.9}}"#,
            last_user
        ))
    }

    fn model_name(&self) -> &str {
        "slow-echo"
    }
}

struct NoopDirectory;

#[async_trait]
impl AgentDirectory for NoopDirectory {
    async fn find_available(&self) -> Result<Option<AvailableAgent>> {
        Ok(None)
    }

    async fn set_status(&self, _agent_id: uuid::Uuid, _status: AgentStatus) -> Result<()> {
        Ok(())
    }
}

struct NoopEscalations;

#[async_trait]
impl EscalationStore for NoopEscalations {
    async fn insert(&self, _record: &EscalationRecord) -> Result<()> {
        Ok(())
    }

    async fn has_open(&self, _call_id: &str) -> Result<bool> {
        Ok(false)
    }
}

struct NoopNotifier;

#[async_trait]
impl AgentNotifier for NoopNotifier {
    async fn notify(&self, _agent_id: uuid::Uuid, _call_id: &str, _reason: &str) -> Result<()> {
        Ok(())
    }
}

struct NoopTransfer;

#[async_trait]
impl CallTransfer for NoopTransfer {
    async fn transfer(&self, _call_id: &str, _destination: &str) -> Result<bool> {
        Ok(false)
    }
}

fn agent() -> Arc<SupportAgent> {
    let store = Arc::new(CallSessionStore::with_limits(10, Duration::from_secs(3600)));
    let retriever = Arc::new(ContextRetriever::new(
        Arc::new(UnitEmbedder),
        Arc::new(FixedSearch),
        Arc::new(RetrievalCache::new(100, Duration::from_secs(3600))),
        RetrieverConfig::default(),
    ));
    let generator = ScoredGenerator::new(Arc::new(SlowEchoBackend));
    let executor = Arc::new(EscalationExecutor::new(
        Arc::new(NoopDirectory),
        Arc::new(NoopEscalations),
        Arc::new(NoopNotifier),
        Arc::new(NoopTransfer),
        true,
    ));
    Arc::new(SupportAgent::new(
        store,
        retriever,
        generator,
        EscalationEngine::new(EscalationConfig::default()),
        executor,
    ))
}

#[tokio::test]
async fn full_call_lifecycle() {
    let agent = agent();

    let (language, greeting) = agent.handle_call_started("c1", "en-US");
    assert_eq!(language, Language::EnUs);
    assert!(!greeting.is_empty());

    let outcome = agent
        .handle_transcription("c1", "Where is my refund?")
        .await
        .unwrap();
    match outcome {
        TurnOutcome::Reply { response, context, .. } => {
            assert_eq!(response, "echo: Where is my refund?");
            assert_eq!(
                context,
                vec!["Refunds are processed within 5 business days.".to_string()]
            );
        },
        other => panic!("expected reply, got {:?}", other),
    }

    assert_eq!(agent.handle_call_ended("c1").await, Some(2));
    assert_eq!(agent.handle_call_ended("c1").await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_turns_on_one_call_do_not_interleave() {
    let agent = agent();
    agent.handle_call_started("c1", "en-US");

    let a1 = agent.clone();
    let a2 = agent.clone();
    let t1 = tokio::spawn(async move { a1.handle_transcription("c1", "first question").await });
    let t2 = tokio::spawn(async move { a2.handle_transcription("c1", "second question").await });

    t1.await.unwrap().unwrap();
    t2.await.unwrap().unwrap();

    let handle = agent.store().get("c1").await.unwrap();
    let session = handle.lock().await;
    assert_eq!(session.message_count(), 4);

    // Turns serialize per call: user then its own echo, never interleaved
    for pair in session.messages.chunks(2) {
        assert_eq!(pair[0].role, TurnRole::User);
        assert_eq!(pair[1].role, TurnRole::Assistant);
        assert_eq!(pair[1].content, format!("echo: {}", pair[0].content));
    }
}

/// Backend whose replies always score below the escalation threshold
struct LowConfidenceBackend;

#[async_trait]
impl ChatBackend for LowConfidenceBackend {
    async fn chat(&self, _messages: &[ChatMessage]) -> std::result::Result<String, LlmError> {
        Ok(r#"{"response": "I'm not sure about that.", "confidence": 0.1}"#.to_string())
    }

    fn model_name(&self) -> &str {
        "low-confidence"
    }
}

/// Directory with a slow lookup, stretching the window between the
/// open-escalation check and the record insert.
struct SlowDirectory;

#[async_trait]
impl AgentDirectory for SlowDirectory {
    async fn find_available(&self) -> Result<Option<AvailableAgent>> {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(Some(AvailableAgent {
            agent_id: Uuid::new_v4(),
            contact_address: "+15550100".to_string(),
        }))
    }

    async fn set_status(&self, _agent_id: Uuid, _status: AgentStatus) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingEscalations {
    records: Mutex<Vec<EscalationRecord>>,
}

#[async_trait]
impl EscalationStore for RecordingEscalations {
    async fn insert(&self, record: &EscalationRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn has_open(&self, call_id: &str) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .iter()
            .any(|r| r.call_id == call_id && r.is_open()))
    }
}

struct AcceptingTransfer;

#[async_trait]
impl CallTransfer for AcceptingTransfer {
    async fn transfer(&self, _call_id: &str, _destination: &str) -> Result<bool> {
        Ok(true)
    }
}

fn low_confidence_agent() -> (Arc<SupportAgent>, Arc<RecordingEscalations>) {
    let store = Arc::new(CallSessionStore::with_limits(10, Duration::from_secs(3600)));
    let retriever = Arc::new(ContextRetriever::new(
        Arc::new(UnitEmbedder),
        Arc::new(FixedSearch),
        Arc::new(RetrievalCache::new(100, Duration::from_secs(3600))),
        RetrieverConfig::default(),
    ));
    let generator = ScoredGenerator::new(Arc::new(LowConfidenceBackend));
    let escalations = Arc::new(RecordingEscalations::default());
    let executor = Arc::new(EscalationExecutor::new(
        Arc::new(SlowDirectory),
        escalations.clone(),
        Arc::new(NoopNotifier),
        Arc::new(AcceptingTransfer),
        true,
    ));
    (
        Arc::new(SupportAgent::new(
            store,
            retriever,
            generator,
            EscalationEngine::new(EscalationConfig::default()),
            executor,
        )),
        escalations,
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn rapid_low_confidence_turns_escalate_a_call_once() {
    let (agent, escalations) = low_confidence_agent();
    agent.handle_call_started("c1", "en-US");

    let a1 = agent.clone();
    let a2 = agent.clone();
    let t1 = tokio::spawn(async move { a1.handle_transcription("c1", "hard question one").await });
    let t2 = tokio::spawn(async move { a2.handle_transcription("c1", "hard question two").await });

    let o1 = t1.await.unwrap().unwrap();
    let o2 = t2.await.unwrap().unwrap();
    assert!(matches!(o1, TurnOutcome::Escalation { .. }));
    assert!(matches!(o2, TurnOutcome::Escalation { .. }));

    // One unresolved record per call: the second turn waits on the session
    // lock and hits the open-escalation guard instead of racing past it
    let records = escalations.records.lock();
    let open = records.iter().filter(|r| r.is_open()).count();
    assert_eq!(open, 1);
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn turns_on_distinct_calls_are_independent() {
    let agent = agent();
    agent.handle_call_started("c1", "en-US");
    agent.handle_call_started("c2", "ar-SA");

    let a1 = agent.clone();
    let a2 = agent.clone();
    let t1 = tokio::spawn(async move { a1.handle_transcription("c1", "hello from one").await });
    let t2 = tokio::spawn(async move { a2.handle_transcription("c2", "hello from two").await });

    t1.await.unwrap().unwrap();
    t2.await.unwrap().unwrap();

    let h1 = agent.store().get("c1").await.unwrap();
    let h2 = agent.store().get("c2").await.unwrap();
    assert_eq!(h1.lock().await.message_count(), 2);
    assert_eq!(h2.lock().await.message_count(), 2);
    assert_eq!(h2.lock().await.language, Language::ArSa);
}
