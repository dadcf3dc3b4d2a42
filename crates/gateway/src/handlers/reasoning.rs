//! Structured reasoning handlers

use axum::{extract::State, Json};
use reasonforge_common::{
    engine::{
        AnalysisQuery, AnalysisResponse, DecisionQuery, DecisionResponse, ReasoningQuery,
        ReasoningResponse,
    },
    errors::Result,
};

use super::validate_request;
use crate::AppState;

/// Reason about a question with the requested pattern
pub async fn reason(
    State(state): State<AppState>,
    Json(request): Json<ReasoningQuery>,
) -> Result<Json<ReasoningResponse>> {
    validate_request(&request)?;
    Ok(Json(state.engine.reason(request).await?))
}

/// Pick among options with a confidence score
pub async fn decide(
    State(state): State<AppState>,
    Json(request): Json<DecisionQuery>,
) -> Result<Json<DecisionResponse>> {
    validate_request(&request)?;
    Ok(Json(state.engine.decide(request).await?))
}

/// Analyze a topic
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisQuery>,
) -> Result<Json<AnalysisResponse>> {
    validate_request(&request)?;
    Ok(Json(state.engine.analyze(request).await?))
}
