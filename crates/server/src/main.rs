//! Zoid support agent server entry point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use zoid_agent::{CallSessionStore, EscalationEngine, EscalationExecutor, SupportAgent};
use zoid_config::{load_settings, Settings};
use zoid_core::SnippetSearch;
use zoid_llm::{LlmBackendConfig, OpenAiChatBackend, ScoredGenerator};
use zoid_rag::{
    ContextRetriever, HttpEmbedder, HttpEmbedderConfig, InMemorySnippetSearch,
    QdrantSnippetSearch, QdrantSnippetSearchConfig, RetrievalCache, RetrieverConfig,
};
use zoid_server::{create_router, init_metrics, AppState};
use zoid_telephony::{LogNotifier, VapiTransferClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("ZOID_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env = env.as_deref().unwrap_or("default"),
        "Starting Zoid support agent"
    );

    let _metrics_handle = init_metrics();
    tracing::info!("Initialized Prometheus metrics at /metrics");

    // Durable stores; falls back to in-memory if ScyllaDB is unreachable
    let persistence = match zoid_persistence::init(&config.persistence).await {
        Ok(layer) => layer,
        Err(e) => {
            tracing::error!(error = %e, "ScyllaDB init failed, falling back to in-memory stores");
            let disabled = zoid_config::PersistenceConfig {
                enabled: false,
                ..config.persistence.clone()
            };
            zoid_persistence::init(&disabled).await?
        },
    };

    // Retrieval: embedder + vector search (Qdrant, or the in-memory fallback
    // seeded from config)
    let embedder = Arc::new(HttpEmbedder::new(HttpEmbedderConfig {
        endpoint: config.rag.embedding_endpoint.clone(),
        model: config.rag.embedding_model.clone(),
    }));

    let search = init_snippet_search(&config, embedder.clone()).await;

    let cache = Arc::new(RetrievalCache::new(
        config.rag.cache_capacity,
        Duration::from_secs(config.rag.cache_ttl_secs),
    ));
    let retriever = Arc::new(ContextRetriever::new(
        embedder,
        search,
        cache,
        RetrieverConfig {
            top_k: config.rag.top_k,
            timeout: Duration::from_secs(config.rag.timeout_secs),
        },
    ));

    // Generation
    let backend = OpenAiChatBackend::new(LlmBackendConfig {
        endpoint: config.llm.endpoint.clone(),
        model: config.llm.model.clone(),
        api_key: config.llm.api_key.clone(),
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
        timeout: Duration::from_secs(config.llm.timeout_secs),
    })?;
    let generator = ScoredGenerator::new(Arc::new(backend));

    // Sessions + escalation
    let store = Arc::new(CallSessionStore::new(&config.session));
    let engine = EscalationEngine::new(config.escalation.clone());
    let transfer = Arc::new(VapiTransferClient::new(&config.telephony)?);
    let executor = Arc::new(EscalationExecutor::new(
        persistence.agents,
        persistence.escalations,
        Arc::new(LogNotifier),
        transfer,
        config.escalation.mark_agent_busy,
    ));

    let agent = Arc::new(SupportAgent::new(
        store.clone(),
        retriever,
        generator,
        engine,
        executor,
    ));

    spawn_session_sweeper(store, config.session.sweep_interval_secs);

    let state = AppState::new(agent, persistence.call_logs, &config.server.webhook_token);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Pick the snippet search backend: Qdrant when configured and reachable,
/// otherwise the in-memory knowledge base seeded from config.
async fn init_snippet_search(
    config: &Settings,
    embedder: Arc<HttpEmbedder>,
) -> Arc<dyn SnippetSearch> {
    if !config.rag.qdrant_endpoint.is_empty() {
        let qdrant_config = QdrantSnippetSearchConfig {
            endpoint: config.rag.qdrant_endpoint.clone(),
            collection: config.rag.qdrant_collection.clone(),
            api_key: None,
        };
        match QdrantSnippetSearch::new(qdrant_config).await {
            Ok(search) => match search.health_check().await {
                Ok(()) => {
                    tracing::info!(
                        endpoint = %config.rag.qdrant_endpoint,
                        collection = %config.rag.qdrant_collection,
                        "Qdrant snippet search initialized"
                    );
                    return Arc::new(search);
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Qdrant health check failed, using in-memory store");
                },
            },
            Err(e) => {
                tracing::warn!(error = %e, "Qdrant connection failed, using in-memory store");
            },
        }
    }

    match InMemorySnippetSearch::build(embedder, &config.rag.knowledge_chunks).await {
        Ok(store) => {
            if store.is_empty() {
                tracing::warn!("Knowledge base is empty, retrieval will return no context");
            }
            Arc::new(store)
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to embed seed chunks, knowledge base is empty");
            Arc::new(InMemorySnippetSearch::from_vectors(Vec::new()))
        },
    }
}

/// Periodically drop expired call sessions
fn spawn_session_sweeper(store: Arc<CallSessionStore>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::info!(purged, "Session sweep complete");
            }
        }
    });
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zoid=info,tower_http=info".into());

    let fmt_layer = if config.server.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
