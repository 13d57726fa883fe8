use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
///
/// The LanceDB path is required; Redis is optional and the server runs
/// without caching when it is absent. LLM client settings are read separately
/// by `LlmClientConfig::from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Filesystem path to the LanceDB data directory.
    pub lancedb_path: String,
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
    /// Address to bind the HTTP server to.
    pub bind_addr: String,
    /// How many clauses vector search returns per query.
    pub search_top_k: usize,
    /// When false, vector distances are distrusted and the lexical
    /// RelevanceMatcher re-ranks the candidates.
    pub trust_vector_scores: bool,
    /// Word-window parameters for the unstructured-document fallback.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `LANCEDB_PATH`: path to the LanceDB data directory
    ///
    /// Optional:
    /// - `REDIS_URL`: Redis connection string (omit to disable caching)
    /// - `BIND_ADDR` (default "0.0.0.0:8000")
    /// - `SEARCH_TOP_K` (default 5)
    /// - `TRUST_VECTOR_SCORES` (default true; "false"/"0" enables lexical re-rank)
    /// - `CHUNK_SIZE` (default 1000), `CHUNK_OVERLAP` (default 200)
    pub fn from_env() -> Result<Self, AppError> {
        let lancedb_path = std::env::var("LANCEDB_PATH").map_err(|_| {
            AppError::Config("LANCEDB_PATH environment variable is required".to_string())
        })?;

        let redis_url = std::env::var("REDIS_URL").ok();

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let search_top_k = std::env::var("SEARCH_TOP_K")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(5);

        let trust_vector_scores = std::env::var("TRUST_VECTOR_SCORES")
            .map(|s| !matches!(s.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let chunk_size = std::env::var("CHUNK_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1000);

        let chunk_overlap = std::env::var("CHUNK_OVERLAP")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(200);

        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "CHUNK_OVERLAP ({chunk_overlap}) must be smaller than CHUNK_SIZE ({chunk_size})"
            )));
        }

        Ok(Self {
            lancedb_path,
            redis_url,
            bind_addr,
            search_top_k,
            trust_vector_scores,
            chunk_size,
            chunk_overlap,
        })
    }
}
