//! Code generation handler

use axum::{extract::State, Json};
use reasonforge_common::{
    engine::{CodeResponse, CodeTask},
    errors::Result,
};

use super::validate_request;
use crate::AppState;

/// Generate code and an explanation for a task
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<CodeTask>,
) -> Result<Json<CodeResponse>> {
    validate_request(&request)?;
    Ok(Json(state.engine.generate_code(request).await?))
}
