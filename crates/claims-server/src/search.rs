/// Semantic clause search.
///
/// Embeds the query with the fastembed model, runs vector search in LanceDB,
/// and converts `_distance` into a [0,1] relevance score. When the vector
/// scores are distrusted, the lexical `RelevanceMatcher` re-scores and
/// re-orders the candidates instead — an independent re-ranking, not a
/// replacement for the vector retrieval. Results are cached in Redis.
use std::sync::Arc;

use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use tracing::{info, warn};

use claims_common::embedding::Embedder;
use claims_common::vectordb::VectorDb;

use crate::cache::ClauseCache;
use crate::model::ClauseMatch;
use crate::rules::RelevanceMatcher;

const CLAUSE_TABLE: &str = "clauses";

pub struct ClauseSearch {
    embedder: Arc<Embedder>,
    vectordb: Arc<VectorDb>,
    cache: Arc<ClauseCache>,
    matcher: RelevanceMatcher,
    trust_vector_scores: bool,
}

impl ClauseSearch {
    pub fn new(
        embedder: Arc<Embedder>,
        vectordb: Arc<VectorDb>,
        cache: Arc<ClauseCache>,
        trust_vector_scores: bool,
    ) -> Self {
        Self {
            embedder,
            vectordb,
            cache,
            matcher: RelevanceMatcher::new(),
            trust_vector_scores,
        }
    }

    /// Find the clauses most relevant to the query.
    ///
    /// Returns up to `limit` results ordered by relevance. Identical queries
    /// hit the Redis cache until the index changes.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ClauseMatch>, crate::error::AppError> {
        if let Some(cached) = self.cache.get_search_results(query, limit).await {
            info!(query, "search cache hit");
            return Ok(cached);
        }

        if !self.vectordb.table_exists(CLAUSE_TABLE).await? {
            info!("no documents indexed yet, returning no matches");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        let batches = self
            .vectordb
            .search(CLAUSE_TABLE, &query_embedding, limit)
            .await?;

        let mut results = extract_clause_matches(&batches);

        if !self.trust_vector_scores {
            results = self.matcher.rank(query, results);
        }

        self.cache.set_search_results(query, limit, &results).await;

        Ok(results)
    }

    /// LanceDB table holding clause vectors.
    pub fn table_name() -> &'static str {
        CLAUSE_TABLE
    }
}

/// Extract `ClauseMatch` values from LanceDB search result batches.
///
/// Expected columns: id, title, content, document_id (Utf8), _distance (Float32).
fn extract_clause_matches(batches: &[RecordBatch]) -> Vec<ClauseMatch> {
    let mut results = Vec::new();

    for batch in batches {
        let num_rows = batch.num_rows();
        let schema = batch.schema();

        let id_col = get_string_column(batch, &schema, "id");
        let title_col = get_string_column(batch, &schema, "title");
        let content_col = get_string_column(batch, &schema, "content");
        let document_col = get_string_column(batch, &schema, "document_id");
        let distance_col = get_float_column(batch, &schema, "_distance");

        let (Some(id_col), Some(title_col), Some(content_col)) = (id_col, title_col, content_col)
        else {
            warn!("search result batch missing expected columns");
            continue;
        };

        for row in 0..num_rows {
            let distance: f32 = distance_col.map(|c| c.value(row)).unwrap_or(0.0);

            // LanceDB reports L2 distance; invert so higher is more similar,
            // clamped to [0, 1].
            let score: f32 = (1.0_f32 - distance).max(0.0);

            results.push(ClauseMatch {
                clause_id: id_col.value(row).to_string(),
                clause_title: title_col.value(row).to_string(),
                clause_content: content_col.value(row).to_string(),
                relevance_score: score,
                document_id: document_col.map(|c| c.value(row).to_string()),
            });
        }
    }

    results
}

fn get_string_column<'a>(
    batch: &'a RecordBatch,
    schema: &arrow_schema::Schema,
    name: &str,
) -> Option<&'a StringArray> {
    let idx = schema.index_of(name).ok()?;
    batch.column(idx).as_any().downcast_ref::<StringArray>()
}

fn get_float_column<'a>(
    batch: &'a RecordBatch,
    schema: &arrow_schema::Schema,
    name: &str,
) -> Option<&'a Float32Array> {
    let idx = schema.index_of(name).ok()?;
    batch.column(idx).as_any().downcast_ref::<Float32Array>()
}
