/// Redis caching layer for the claims server.
///
/// All operations return `Option<T>` for graceful degradation; when Redis is
/// down, callers fall through to compute from source.
///
/// Key schema (namespaced to avoid collisions):
/// - `claims:v1:search:{sha256(query|limit)}` — JSON Vec<ClauseMatch> (TTL: 3600s)
/// - `claims:v1:document:{id}` — JSON DocumentMeta (no TTL, deleted with the document)
/// - `claims:v1:document_ids` — JSON Vec<String> of known document ids (no TTL)
use sha2::{Digest, Sha256};
use tracing::warn;

use claims_common::redis::RedisCache;

use crate::model::{ClauseMatch, DocumentMeta};

const KEY_PREFIX: &str = "claims:v1:";
const SEARCH_TTL_SECS: u64 = 3600;

pub struct ClauseCache {
    redis: RedisCache,
}

impl ClauseCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    // --- Search results ---

    pub async fn get_search_results(&self, query: &str, limit: usize) -> Option<Vec<ClauseMatch>> {
        let key = search_key(query, limit);
        let json = self.redis.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_search_results(&self, query: &str, limit: usize, results: &[ClauseMatch]) {
        let key = search_key(query, limit);
        if let Ok(json) = serde_json::to_string(results) {
            self.redis.set_with_ttl(&key, &json, SEARCH_TTL_SECS).await;
        }
    }

    /// Cached search results go stale the moment the clause index changes.
    pub async fn invalidate_search_results(&self) {
        self.redis
            .delete_by_prefix(&format!("{KEY_PREFIX}search:"))
            .await;
    }

    // --- Document metadata ---

    pub async fn get_document(&self, document_id: &str) -> Option<DocumentMeta> {
        let key = format!("{KEY_PREFIX}document:{document_id}");
        let json = self.redis.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_document(&self, meta: &DocumentMeta) {
        let key = format!("{KEY_PREFIX}document:{}", meta.document_id);
        if let Ok(json) = serde_json::to_string(meta) {
            self.redis.set(&key, &json).await;
        }
        let mut ids = self.document_ids().await;
        if !ids.contains(&meta.document_id) {
            ids.push(meta.document_id.clone());
            self.set_document_ids(&ids).await;
        }
    }

    pub async fn delete_document(&self, document_id: &str) {
        let key = format!("{KEY_PREFIX}document:{document_id}");
        self.redis.delete(&key).await;
        let ids: Vec<String> = self
            .document_ids()
            .await
            .into_iter()
            .filter(|id| id != document_id)
            .collect();
        self.set_document_ids(&ids).await;
    }

    pub async fn document_ids(&self) -> Vec<String> {
        let key = format!("{KEY_PREFIX}document_ids");
        let Some(json) = self.redis.get(&key).await else {
            return Vec::new();
        };
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .unwrap_or_default()
    }

    async fn set_document_ids(&self, ids: &[String]) {
        let key = format!("{KEY_PREFIX}document_ids");
        if let Ok(json) = serde_json::to_string(ids) {
            self.redis.set(&key, &json).await;
        }
    }
}

/// Deterministic cache key for a search query.
fn search_key(query: &str, limit: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(b"|");
    hasher.update(limit.to_string().as_bytes());
    let hash = hasher.finalize();
    format!("{KEY_PREFIX}search:{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::search_key;

    #[test]
    fn search_key_is_deterministic_and_limit_sensitive() {
        let a = search_key("knee surgery", 5);
        let b = search_key("knee surgery", 5);
        let c = search_key("knee surgery", 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("claims:v1:search:"));
    }
}
