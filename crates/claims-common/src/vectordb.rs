/// LanceDB vector database wrapper.
///
/// Typed interface over LanceDB for storing and searching clause embeddings.
/// The table schema used by the claims server is:
/// - id: Utf8 (not null) — clause id qualified by its document ("{document_id}:{n.n}")
/// - title: Utf8 (not null)
/// - content: Utf8 (not null) — the clause text that was embedded
/// - document_id: Utf8 (not null) — owning document, used for scoped deletes
/// - embedding: FixedSizeList<Float32, 768> (not null)
use std::sync::Arc;

use arrow_array::{RecordBatch, RecordBatchIterator};
use arrow_schema::Schema;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::info;

use crate::error::CommonError;

pub struct VectorDb {
    db: lancedb::Connection,
}

impl VectorDb {
    /// Connect to a LanceDB database at the given filesystem path.
    pub async fn connect(path: &str) -> Result<Self, CommonError> {
        let db = lancedb::connect(path)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("connection failed: {e}")))?;
        Ok(Self { db })
    }

    /// Returns true if the named table exists.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool, CommonError> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("listing tables failed: {e}")))?;
        Ok(names.iter().any(|n| n == table_name))
    }

    /// Append record batches to a table, creating it first if it does not exist.
    ///
    /// Uploads are additive: each document contributes new rows keyed by its
    /// `document_id`, removed later via `delete_where`.
    pub async fn append(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
        batches: Vec<RecordBatch>,
    ) -> Result<(), CommonError> {
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        let batch_iter = RecordBatchIterator::new(batches.into_iter().map(Ok), schema.clone());

        if self.table_exists(table_name).await? {
            let table = self.open(table_name).await?;
            table
                .add(Box::new(batch_iter))
                .execute()
                .await
                .map_err(|e| CommonError::VectorDb(format!("append failed: {e}")))?;
        } else {
            self.db
                .create_table(table_name, Box::new(batch_iter))
                .execute()
                .await
                .map_err(|e| CommonError::VectorDb(format!("create table failed: {e}")))?;
        }

        info!(table = table_name, rows, "clause vectors stored");
        Ok(())
    }

    /// Search for the nearest vectors to the given query embedding.
    ///
    /// Returns up to `limit` results as RecordBatches, including the `_distance`
    /// column added by LanceDB.
    pub async fn search(
        &self,
        table_name: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RecordBatch>, CommonError> {
        let table = self.open(table_name).await?;

        let results = table
            .vector_search(query_embedding)
            .map_err(|e| CommonError::VectorDb(format!("vector search setup failed: {e}")))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("vector search failed: {e}")))?;

        futures::TryStreamExt::try_collect(results)
            .await
            .map_err(|e| CommonError::VectorDb(format!("collecting search results failed: {e}")))
    }

    /// Delete all rows matching a SQL predicate (DataFusion syntax).
    ///
    /// Used to drop every clause belonging to a document:
    /// `document_id = '<id>'`.
    pub async fn delete_where(&self, table_name: &str, predicate: &str) -> Result<(), CommonError> {
        let table = self.open(table_name).await?;
        table
            .delete(predicate)
            .await
            .map_err(|e| CommonError::VectorDb(format!("delete failed: {e}")))?;
        info!(table = table_name, predicate, "rows deleted");
        Ok(())
    }

    /// Count rows in a table, optionally restricted by a SQL predicate.
    ///
    /// Returns 0 when the table has not been created yet.
    pub async fn count_rows(
        &self,
        table_name: &str,
        predicate: Option<String>,
    ) -> Result<usize, CommonError> {
        if !self.table_exists(table_name).await? {
            return Ok(0);
        }
        let table = self.open(table_name).await?;
        table
            .count_rows(predicate)
            .await
            .map_err(|e| CommonError::VectorDb(format!("count rows failed: {e}")))
    }

    async fn open(&self, table_name: &str) -> Result<lancedb::Table, CommonError> {
        self.db
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("open table failed: {e}")))
    }
}

/// Escape a string value for use inside a single-quoted SQL literal.
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
