//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub default_model: String,
    pub models_available: Vec<String>,
    pub documents_indexed: usize,
    pub chunks_indexed: usize,
}

/// Liveness check with a summary of what the service can do
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let documents_indexed = state
        .documents
        .list_documents()
        .map(|docs| docs.len())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: reasonforge_common::VERSION.to_string(),
        default_model: state.config.llm.default_model.clone(),
        models_available: state.config.available_models(),
        documents_indexed,
        chunks_indexed: state.documents.chunk_count(),
    })
}
