/// HTTP surface for the claims analysis service.
///
/// Routes:
/// - `POST /analyze` — coverage decision for a natural-language query
/// - `POST /documents` — index a policy document (page text, already extracted)
/// - `DELETE /documents/{document_id}` — drop a document and its clauses
/// - `GET /documents/stats` — vector index statistics
/// - `GET /health` — service and vector store health
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use claims_common::embedding::EMBEDDING_DIM;

use crate::cache::ClauseCache;
use crate::documents::DocumentProcessor;
use crate::error::AppError;
use crate::ids::new_document_id;
use crate::index::ClauseIndex;
use crate::llm::LlmAnalyst;
use crate::model::{
    AnalyzeRequest, DocumentMeta, DocumentUploadRequest, DocumentUploadResponse,
    QueryAnalysisResponse,
};
use crate::search::ClauseSearch;

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<ClauseSearch>,
    pub index: Arc<ClauseIndex>,
    pub analyst: Arc<LlmAnalyst>,
    pub processor: Arc<DocumentProcessor>,
    pub cache: Arc<ClauseCache>,
    pub search_top_k: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/documents", post(upload_document))
        .route("/documents/stats", get(document_stats))
        .route("/documents/{document_id}", delete(delete_document))
        .route("/health", get(health))
        .with_state(state)
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<QueryAnalysisResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    let started = Instant::now();

    let entities = state.analyst.extract_entities(query).await;
    let matched = state.search.search(query, state.search_top_k).await?;
    let outcome = state.analyst.adjudicate(query, &entities, &matched).await;

    let decision_source = outcome.source();
    let decision = outcome.into_decision();
    let processing_time = started.elapsed().as_secs_f64();

    info!(
        query,
        matches = matched.len(),
        decision = ?decision.decision,
        source = ?decision_source,
        processing_time,
        "query analyzed"
    );

    Ok(Json(QueryAnalysisResponse {
        query: query.to_string(),
        extracted_entities: entities,
        matched_clauses: matched,
        decision,
        decision_source,
        processing_time,
    }))
}

async fn upload_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentUploadRequest>,
) -> Result<Json<DocumentUploadResponse>, AppError> {
    if request.filename.trim().is_empty() {
        return Err(AppError::BadRequest(
            "filename must not be empty".to_string(),
        ));
    }
    if request.pages.is_empty() {
        return Err(AppError::BadRequest(
            "document must contain at least one page".to_string(),
        ));
    }

    let document_id = new_document_id();
    let processed = state.processor.process(&request.pages);

    state.index.add_document(&document_id, &processed.clauses).await?;

    state.cache.invalidate_search_results().await;
    state
        .cache
        .set_document(&DocumentMeta {
            document_id: document_id.clone(),
            filename: request.filename.clone(),
            pages_processed: processed.total_pages,
            clauses_extracted: processed.clauses.len(),
        })
        .await;

    let summary = state.analyst.summarize_clauses(&processed.clauses).await;

    info!(
        document_id,
        filename = request.filename,
        clauses = processed.clauses.len(),
        "document processed"
    );

    Ok(Json(DocumentUploadResponse {
        document_id,
        filename: request.filename,
        pages_processed: processed.total_pages,
        clauses_extracted: processed.clauses.len(),
        status: "processed".to_string(),
        summary: Some(summary),
    }))
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    message: String,
}

async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let known_in_cache = state.cache.get_document(&document_id).await.is_some();
    let indexed_clauses = state.index.document_clauses(&document_id).await?;

    if !known_in_cache && indexed_clauses == 0 {
        return Err(AppError::NotFound(document_id));
    }

    state.index.remove_document(&document_id).await?;
    state.cache.delete_document(&document_id).await;
    state.cache.invalidate_search_results().await;

    info!(document_id, "document deleted");

    Ok(Json(DeleteResponse {
        message: format!("Document {document_id} deleted successfully"),
    }))
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    total_vectors: usize,
    index_dimension: usize,
    documents: Vec<DocumentMeta>,
}

async fn document_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let total_vectors = state.index.total_clauses().await?;

    let mut documents = Vec::new();
    for id in state.cache.document_ids().await {
        if let Some(meta) = state.cache.get_document(&id).await {
            documents.push(meta);
        }
    }

    Ok(Json(StatsResponse {
        total_vectors,
        index_dimension: EMBEDDING_DIM,
        documents,
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    vector_database: VectorDbHealth,
}

#[derive(Debug, Serialize)]
struct VectorDbHealth {
    total_vectors: usize,
    dimension: usize,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let total_vectors = state.index.total_clauses().await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        vector_database: VectorDbHealth {
            total_vectors,
            dimension: EMBEDDING_DIM,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_shape() {
        let body = HealthResponse {
            status: "healthy",
            vector_database: VectorDbHealth {
                total_vectors: 12,
                dimension: EMBEDDING_DIM,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["vector_database"]["total_vectors"], 12);
        assert_eq!(json["vector_database"]["dimension"], 768);
    }

    #[test]
    fn delete_response_names_the_document() {
        let body = DeleteResponse {
            message: format!("Document {} deleted successfully", "abc123"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "Document abc123 deleted successfully");
    }
}
