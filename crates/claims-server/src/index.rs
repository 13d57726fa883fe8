/// Clause indexing: embeddings in, LanceDB rows out.
///
/// Each upload appends one batch of clause vectors tagged with the owning
/// `document_id`; deletion removes every row with that tag. Counts back the
/// stats and health endpoints.
use std::sync::Arc;

use arrow_array::{ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use tracing::info;

use claims_common::embedding::{Embedder, EMBEDDING_DIM};
use claims_common::error::CommonError;
use claims_common::vectordb::{sql_quote, VectorDb};

use crate::error::AppError;
use crate::model::Clause;
use crate::search::ClauseSearch;

pub struct ClauseIndex {
    embedder: Arc<Embedder>,
    vectordb: Arc<VectorDb>,
}

impl ClauseIndex {
    pub fn new(embedder: Arc<Embedder>, vectordb: Arc<VectorDb>) -> Self {
        Self { embedder, vectordb }
    }

    /// Embed and store a document's clauses.
    pub async fn add_document(&self, document_id: &str, clauses: &[Clause]) -> Result<(), AppError> {
        if clauses.is_empty() {
            return Ok(());
        }

        let contents: Vec<String> = clauses.iter().map(|c| c.clause_content.clone()).collect();
        let embeddings = self.embedder.embed_clauses(&contents).await?;

        if embeddings.len() != clauses.len() {
            return Err(AppError::Common(CommonError::Embedding(format!(
                "embedding count mismatch: expected {}, got {}",
                clauses.len(),
                embeddings.len()
            ))));
        }

        let batch = build_clause_batch(document_id, clauses, &embeddings)?;
        let schema = batch.schema();
        self.vectordb
            .append(ClauseSearch::table_name(), schema, vec![batch])
            .await?;

        info!(document_id, clauses = clauses.len(), "document indexed");
        Ok(())
    }

    /// Remove every clause belonging to a document.
    pub async fn remove_document(&self, document_id: &str) -> Result<(), AppError> {
        if !self.vectordb.table_exists(ClauseSearch::table_name()).await? {
            return Ok(());
        }
        let predicate = format!("document_id = {}", sql_quote(document_id));
        self.vectordb
            .delete_where(ClauseSearch::table_name(), &predicate)
            .await?;
        Ok(())
    }

    /// Total clause vectors in the index.
    pub async fn total_clauses(&self) -> Result<usize, AppError> {
        Ok(self
            .vectordb
            .count_rows(ClauseSearch::table_name(), None)
            .await?)
    }

    /// Clause vectors belonging to one document.
    pub async fn document_clauses(&self, document_id: &str) -> Result<usize, AppError> {
        let predicate = format!("document_id = {}", sql_quote(document_id));
        Ok(self
            .vectordb
            .count_rows(ClauseSearch::table_name(), Some(predicate))
            .await?)
    }
}

/// Build the Arrow RecordBatch for one document's clauses.
fn build_clause_batch(
    document_id: &str,
    clauses: &[Clause],
    embeddings: &[Vec<f32>],
) -> Result<RecordBatch, AppError> {
    let embedding_dim = EMBEDDING_DIM as i32;

    // Heading-derived ids like "2.1" repeat across documents; qualify them so
    // cited clause ids stay unambiguous in mixed result sets.
    let ids: Vec<String> = clauses
        .iter()
        .map(|c| format!("{document_id}:{}", c.clause_id))
        .collect();
    let titles: Vec<&str> = clauses.iter().map(|c| c.clause_title.as_str()).collect();
    let contents: Vec<&str> = clauses.iter().map(|c| c.clause_content.as_str()).collect();
    let document_ids: Vec<&str> = clauses.iter().map(|_| document_id).collect();

    let id_array: ArrayRef = Arc::new(StringArray::from_iter_values(ids));
    let title_array: ArrayRef = Arc::new(StringArray::from(titles));
    let content_array: ArrayRef = Arc::new(StringArray::from(contents));
    let document_array: ArrayRef = Arc::new(StringArray::from(document_ids));

    let flat_values: Vec<f32> = embeddings.iter().flat_map(|e| e.iter().copied()).collect();
    let values_array = Float32Array::from(flat_values);
    let embedding_array: ArrayRef = Arc::new(
        FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            embedding_dim,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| {
            AppError::Common(CommonError::VectorDb(format!(
                "failed to build embedding array: {e}"
            )))
        })?,
    );

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("document_id", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                embedding_dim,
            ),
            false,
        ),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            id_array,
            title_array,
            content_array,
            document_array,
            embedding_array,
        ],
    )
    .map_err(|e| {
        AppError::Common(CommonError::VectorDb(format!(
            "failed to build record batch: {e}"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_columns_line_up() {
        let clauses = vec![
            Clause {
                clause_id: "1.1".to_string(),
                clause_title: "Clause 1.1".to_string(),
                clause_content: "coverage limit 500,000".to_string(),
            },
            Clause {
                clause_id: "1.2".to_string(),
                clause_title: "Clause 1.2".to_string(),
                clause_content: "waiting period of 12 months".to_string(),
            },
        ];
        let embeddings = vec![vec![0.0f32; EMBEDDING_DIM], vec![0.5f32; EMBEDDING_DIM]];
        let batch = build_clause_batch("doc-1", &clauses, &embeddings).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);

        let doc_col = batch
            .column(3)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(doc_col.value(0), "doc-1");
        assert_eq!(doc_col.value(1), "doc-1");
    }

    #[test]
    fn clause_ids_are_qualified_by_document() {
        let clauses = vec![Clause {
            clause_id: "2.1".to_string(),
            clause_title: "Clause 2.1".to_string(),
            clause_content: "waiting period of 12 months".to_string(),
        }];
        let embeddings = vec![vec![0.0f32; EMBEDDING_DIM]];

        let batch_a = build_clause_batch("doc-a", &clauses, &embeddings).unwrap();
        let batch_b = build_clause_batch("doc-b", &clauses, &embeddings).unwrap();

        let id_a = batch_a
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .value(0)
            .to_string();
        let id_b = batch_b
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .value(0)
            .to_string();

        assert_eq!(id_a, "doc-a:2.1");
        assert_ne!(id_a, id_b);
    }
}
