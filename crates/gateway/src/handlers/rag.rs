//! RAG handlers

use axum::{extract::State, Json};
use reasonforge_common::{
    engine::{MultiHopQuery, MultiHopResponse, RagQuery, RagResponse},
    errors::Result,
};
use std::time::Instant;

use super::validate_request;
use crate::AppState;

/// Answer from indexed documents with sources
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<RagQuery>,
) -> Result<Json<RagResponse>> {
    validate_request(&request)?;
    let start = Instant::now();

    let response = state.engine.rag_query(request).await?;

    tracing::info!(
        passages_used = response.passages_used,
        confidence = response.confidence,
        model = %response.model,
        latency_ms = start.elapsed().as_millis() as u64,
        "RAG query completed"
    );
    Ok(Json(response))
}

/// Answer questions that need several retrieval rounds
pub async fn multi_hop(
    State(state): State<AppState>,
    Json(request): Json<MultiHopQuery>,
) -> Result<Json<MultiHopResponse>> {
    validate_request(&request)?;
    let start = Instant::now();

    let response = state.engine.multi_hop_rag(request).await?;

    tracing::info!(
        hops_used = response.hops_used,
        passages = response.passages.len(),
        model = %response.model,
        latency_ms = start.elapsed().as_millis() as u64,
        "Multi-hop query completed"
    );
    Ok(Json(response))
}
