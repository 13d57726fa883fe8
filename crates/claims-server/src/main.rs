mod cache;
mod config;
mod documents;
mod error;
mod ids;
mod index;
mod llm;
mod model;
mod rules;
mod search;
mod server;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use claims_common::embedding::Embedder;
use claims_common::llm::{LlmClient, LlmClientConfig};
use claims_common::redis::RedisCache;
use claims_common::vectordb::VectorDb;

use cache::ClauseCache;
use config::Config;
use documents::DocumentProcessor;
use index::ClauseIndex;
use llm::LlmAnalyst;
use rules::DecisionOrchestrator;
use search::ClauseSearch;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting claims analysis server");

    let config = Config::from_env()?;

    let llm_config = LlmClientConfig::from_env();
    info!(
        base_url = %llm_config.base_url,
        model = %llm_config.model,
        timeout_ms = llm_config.default_timeout.as_millis(),
        max_retries = llm_config.max_retries,
        "llm client configured"
    );
    let llm_client = LlmClient::new(llm_config)?;

    let redis_cache = RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without caching");
    }
    let cache = Arc::new(ClauseCache::new(redis_cache));

    info!("loading embedding model");
    let embedder = Arc::new(Embedder::new().await?);

    let vectordb = Arc::new(VectorDb::connect(&config.lancedb_path).await?);
    info!(path = %config.lancedb_path, "vector database connected");

    let search = Arc::new(ClauseSearch::new(
        embedder.clone(),
        vectordb.clone(),
        cache.clone(),
        config.trust_vector_scores,
    ));
    let index = Arc::new(ClauseIndex::new(embedder, vectordb));
    let analyst = Arc::new(LlmAnalyst::new(llm_client, DecisionOrchestrator::default()));
    let processor = Arc::new(DocumentProcessor::new(
        config.chunk_size,
        config.chunk_overlap,
    ));

    let state = AppState {
        search,
        index,
        analyst,
        processor,
        cache,
        search_top_k: config.search_top_k,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "http server listening");
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
