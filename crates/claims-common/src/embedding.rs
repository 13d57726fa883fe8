/// Embedding wrapper around fastembed.
///
/// `TextEmbedding` from fastembed is synchronous and CPU-bound, so every embed call
/// goes through `tokio::task::spawn_blocking`. The inner ONNX runtime is `!Send`,
/// hence the `Arc` that is only ever handed to blocking tasks.
///
/// The nomic-embed-text-v1.5 model uses task-prefixed inputs:
/// - Indexed clauses: "search_document: {text}"
/// - Queries: "search_query: {text}"
use std::sync::Arc;

use crate::error::CommonError;

/// Embedding dimension of nomic-embed-text-v1.5.
pub const EMBEDDING_DIM: usize = 768;

/// Clause contents are truncated to this many characters before embedding.
/// Policy PDFs occasionally produce pathological multi-page "clauses".
const MAX_EMBED_CHARS: usize = 2000;

/// Wraps fastembed's `TextEmbedding` model for generating clause and query vectors.
pub struct Embedder {
    model: Arc<fastembed::TextEmbedding>,
}

impl Embedder {
    /// Initialize the embedding model (nomic-embed-text-v1.5).
    ///
    /// Downloads the model on first run (~300MB), synchronously inside a
    /// blocking task.
    pub async fn new() -> Result<Self, CommonError> {
        let model = tokio::task::spawn_blocking(|| {
            let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::NomicEmbedTextV15)
                .with_show_download_progress(true);
            fastembed::TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
        .map_err(|e| CommonError::Embedding(format!("model initialization failed: {e}")))?;

        Ok(Self {
            model: Arc::new(model),
        })
    }

    /// Embed clause contents for indexing.
    ///
    /// Inputs are prefixed with "search_document: " and truncated to a bounded
    /// length. Processed in small batches to cap peak memory during inference.
    pub async fn embed_clauses(&self, contents: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        let prefixed: Vec<String> = contents
            .iter()
            .map(|c| {
                let clipped: String = c.chars().take(MAX_EMBED_CHARS).collect();
                format!("search_document: {clipped}")
            })
            .collect();
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.embed(prefixed, Some(4)))
            .await
            .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("clause embedding failed: {e}")))
    }

    /// Embed a single insurance query for search.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError> {
        let prefixed = vec![format!("search_query: {query}")];
        let model = Arc::clone(&self.model);
        let mut results = tokio::task::spawn_blocking(move || model.embed(prefixed, None))
            .await
            .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("query embedding failed: {e}")))?;
        results
            .pop()
            .ok_or_else(|| CommonError::Embedding("empty embedding result".to_string()))
    }

    /// Dimensionality of the produced vectors.
    pub fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}
