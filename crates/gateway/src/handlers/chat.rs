//! Chat handler

use axum::{extract::State, Json};
use reasonforge_common::{
    engine::{ChatRequest, ChatResponse},
    errors::Result,
};

use super::validate_request;
use crate::AppState;

/// Plain conversation, no retrieval or tools
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    validate_request(&request)?;
    Ok(Json(state.engine.chat(request).await?))
}
