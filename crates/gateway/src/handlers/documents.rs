//! Document management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use reasonforge_common::{
    errors::Result,
    retrieval::{DocumentInfo, UploadedDocument},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_request;
use crate::AppState;

/// Request to index a new document
#[derive(Debug, Deserialize, Validate)]
pub struct UploadDocumentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,

    #[validate(length(min = 1, max = 1_000_000))]
    pub content: String,
}

#[derive(Serialize)]
pub struct UploadDocumentResponse {
    #[serde(flatten)]
    pub document: UploadedDocument,
    pub message: String,
}

#[derive(Serialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentInfo>,
    pub total_count: usize,
}

#[derive(Serialize)]
pub struct DeleteDocumentResponse {
    pub message: String,
    pub document_id: String,
}

/// Chunk and index a document for retrieval
pub async fn upload(
    State(state): State<AppState>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<UploadDocumentResponse>)> {
    validate_request(&request)?;

    let document = state.documents.add_document(&request.title, &request.content)?;

    tracing::info!(
        document_id = %document.document_id,
        chunks = document.chunks_created,
        "Document indexed"
    );

    let message = format!("Indexed {} chunks", document.chunks_created);
    Ok((
        StatusCode::CREATED,
        Json(UploadDocumentResponse { document, message }),
    ))
}

/// List indexed documents
pub async fn list(State(state): State<AppState>) -> Result<Json<ListDocumentsResponse>> {
    let documents = state.documents.list_documents()?;
    let total_count = documents.len();
    Ok(Json(ListDocumentsResponse {
        documents,
        total_count,
    }))
}

/// Remove a document and all of its chunks
pub async fn delete(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteDocumentResponse>> {
    let removed = state.documents.delete_document(&document_id)?;

    tracing::info!(document_id = %document_id, chunks = removed, "Document deleted");

    Ok(Json(DeleteDocumentResponse {
        message: format!("Deleted {} chunks", removed),
        document_id,
    }))
}
