/// Error types shared across the claims service crates.
///
/// These errors represent failures in infrastructure components (Redis, vector DB,
/// embeddings) that the service is expected to degrade around. Application-specific
/// errors are defined in the server crate and wrap `CommonError` via `#[from]`.
/// LLM client failures have their own type in `llm.rs` because the caller needs to
/// distinguish them: they trigger the rule-based fallback rather than a 5xx.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("vector db error: {0}")]
    VectorDb(String),

    #[error("embedding error: {0}")]
    Embedding(String),
}
