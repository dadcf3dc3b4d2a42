//! Agent handler

use axum::{extract::State, Json};
use reasonforge_common::{
    engine::{AgentResponse, AgentTask},
    errors::Result,
};
use std::time::Instant;

use super::validate_request;
use crate::AppState;

/// Run the ReAct agent on a task
pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<AgentTask>,
) -> Result<Json<AgentResponse>> {
    validate_request(&request)?;
    let start = Instant::now();

    let response = state.engine.execute_agent(request).await?;

    tracing::info!(
        success = response.success,
        iterations_used = response.iterations_used,
        model = %response.model,
        latency_ms = start.elapsed().as_millis() as u64,
        "Agent run completed"
    );
    Ok(Json(response))
}
